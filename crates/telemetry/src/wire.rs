//! Simulator Telemetry Decoder
//!
//! Decodes the JSON datagrams emitted by the vehicle simulator. Older
//! simulator builds use `wheel_speed_fl` / `vibration_level`; both spellings
//! are accepted.

use crate::error::TelemetryError;
use crate::sample::{Position, TelemetrySample};
use serde::Deserialize;
use tracing::{debug, info};

/// Distance from the origin a fix must exceed before positions are trusted
pub const POSITION_LOCK_DISTANCE: f64 = 0.1;

#[derive(Debug, Deserialize)]
struct WirePacket {
    timestamp: Option<f64>,
    #[serde(alias = "wheel_speed_fl")]
    speed: Option<f64>,
    #[serde(alias = "vibration_level")]
    vibration: Option<f64>,
    #[serde(default, alias = "throttle")]
    throttle_command: f64,
    position_x: Option<f64>,
    position_z: Option<f64>,
    status: Option<String>,
}

/// Stateful packet decoder for one telemetry stream
///
/// The simulator reports `(0, 0)` until its GPS has a fix, so positions are
/// withheld until the first one away from the origin. After that every
/// position is passed through.
#[derive(Debug, Default)]
pub struct PacketDecoder {
    position_locked: bool,
    last_status: Option<String>,
}

impl PacketDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one datagram
    pub fn decode(&mut self, bytes: &[u8]) -> Result<TelemetrySample, TelemetryError> {
        let packet: WirePacket = serde_json::from_slice(bytes)?;

        let timestamp = packet.timestamp.ok_or(TelemetryError::MissingField("timestamp"))?;
        let speed = packet.speed.ok_or(TelemetryError::MissingField("speed"))?;
        let vibration = packet.vibration.ok_or(TelemetryError::MissingField("vibration"))?;

        if packet.status != self.last_status {
            debug!("Simulator status changed: {:?}", packet.status);
            self.last_status = packet.status;
        }

        let mut sample = TelemetrySample::new(timestamp, speed, vibration, packet.throttle_command);

        if let (Some(x), Some(y)) = (packet.position_x, packet.position_z) {
            if !self.position_locked
                && (x.abs() > POSITION_LOCK_DISTANCE || y.abs() > POSITION_LOCK_DISTANCE)
            {
                info!("Position locked at ({:.1}, {:.1})", x, y);
                self.position_locked = true;
            }
            if self.position_locked {
                sample = sample.with_position(Position::new(x, y));
            }
        }

        sample.validate()?;
        Ok(sample)
    }

    /// Last status string reported by the simulator
    pub fn status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    /// Whether a position fix has been seen
    pub fn is_position_locked(&self) -> bool {
        self.position_locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_full_packet() {
        let mut decoder = PacketDecoder::new();
        let sample = decoder
            .decode(br#"{"timestamp": 1.5, "speed": 48.2, "vibration": 0.051,
                "throttle": 0.6, "position_x": 12.0, "position_z": -3.0, "status": "OK"}"#)
            .unwrap();

        assert_eq!(sample.timestamp, 1.5);
        assert_eq!(sample.speed, 48.2);
        assert_eq!(sample.throttle_command, 0.6);
        assert_eq!(sample.position, Some(Position::new(12.0, -3.0)));
        assert_eq!(decoder.status(), Some("OK"));
    }

    #[test]
    fn test_decode_legacy_keys() {
        let mut decoder = PacketDecoder::new();
        let sample = decoder
            .decode(br#"{"timestamp": 2.0, "wheel_speed_fl": 30.0, "vibration_level": 0.03}"#)
            .unwrap();

        assert_eq!(sample.speed, 30.0);
        assert_eq!(sample.vibration, 0.03);
        assert_eq!(sample.throttle_command, 0.0);
        assert_eq!(sample.position, None);
    }

    #[test]
    fn test_missing_timestamp() {
        let mut decoder = PacketDecoder::new();
        let result = decoder.decode(br#"{"speed": 30.0, "vibration": 0.03}"#);
        assert!(matches!(result, Err(TelemetryError::MissingField("timestamp"))));
    }

    #[test]
    fn test_position_withheld_until_fix() {
        let mut decoder = PacketDecoder::new();

        let sample = decoder
            .decode(br#"{"timestamp": 1.0, "speed": 0.0, "vibration": 0.0, "position_x": 0.0, "position_z": 0.0}"#)
            .unwrap();
        assert_eq!(sample.position, None);
        assert!(!decoder.is_position_locked());

        decoder
            .decode(br#"{"timestamp": 2.0, "speed": 5.0, "vibration": 0.01, "position_x": 1.0, "position_z": 0.0}"#)
            .unwrap();
        assert!(decoder.is_position_locked());

        // Back at the origin after the fix is a real position
        let sample = decoder
            .decode(br#"{"timestamp": 3.0, "speed": 5.0, "vibration": 0.01, "position_x": 0.0, "position_z": 0.0}"#)
            .unwrap();
        assert_eq!(sample.position, Some(Position::new(0.0, 0.0)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let mut decoder = PacketDecoder::new();
        assert!(matches!(
            decoder.decode(b"ACTIVATE_HEALING"),
            Err(TelemetryError::MalformedInput(_))
        ));
    }

    proptest! {
        #[test]
        fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let mut decoder = PacketDecoder::new();
            let _ = decoder.decode(&bytes);
        }
    }
}
