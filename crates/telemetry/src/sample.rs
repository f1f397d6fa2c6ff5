//! Telemetry Sample

use crate::error::TelemetryError;
use serde::{Deserialize, Serialize};

/// Planar vehicle position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One telemetry reading from the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Sample time in seconds
    pub timestamp: f64,
    /// Sensor-reported wheel speed (km/h)
    pub speed: f64,
    /// Chassis vibration level (G)
    pub vibration: f64,
    /// Last commanded throttle input
    pub throttle_command: f64,
    /// Position, absent until the vehicle has a fix
    pub position: Option<Position>,
}

impl TelemetrySample {
    /// Create a sample without position
    pub fn new(timestamp: f64, speed: f64, vibration: f64, throttle_command: f64) -> Self {
        Self {
            timestamp,
            speed,
            vibration,
            throttle_command,
            position: None,
        }
    }

    /// Attach a position
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Copy of this sample with the speed replaced
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Reject samples carrying NaN or infinite values
    pub fn validate(&self) -> Result<(), TelemetryError> {
        let fields = [
            ("timestamp", self.timestamp),
            ("speed", self.speed),
            ("vibration", self.vibration),
            ("throttle_command", self.throttle_command),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(TelemetryError::NonFinite { field, value });
            }
        }
        if let Some(position) = self.position {
            if !position.x.is_finite() {
                return Err(TelemetryError::NonFinite { field: "position.x", value: position.x });
            }
            if !position.y.is_finite() {
                return Err(TelemetryError::NonFinite { field: "position.y", value: position.y });
            }
        }
        Ok(())
    }

    /// Feature vector used by the statistical model: (throttle, vibration, speed)
    pub fn features(&self) -> [f64; 3] {
        [self.throttle_command, self.vibration, self.speed]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_finite_sample() {
        let sample = TelemetrySample::new(1.0, 50.0, 0.05, 0.6)
            .with_position(Position::new(3.0, -4.0));
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_nan_speed() {
        let sample = TelemetrySample::new(1.0, f64::NAN, 0.05, 0.6);
        assert!(matches!(
            sample.validate(),
            Err(TelemetryError::NonFinite { field: "speed", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_infinite_position() {
        let sample = TelemetrySample::new(1.0, 10.0, 0.05, 0.6)
            .with_position(Position::new(f64::INFINITY, 0.0));
        assert!(sample.validate().is_err());
    }

    #[test]
    fn test_with_speed_keeps_other_fields() {
        let sample = TelemetrySample::new(2.5, 0.0, 0.05, 0.6);
        let corrected = sample.with_speed(49.0);
        assert_eq!(corrected.speed, 49.0);
        assert_eq!(corrected.timestamp, 2.5);
        assert_eq!(corrected.features(), [0.6, 0.05, 49.0]);
    }
}
