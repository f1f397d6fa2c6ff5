//! Speed Estimator

use anomaly_scorer::CalibrationBaseline;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Why the model could not produce a usable speed
#[derive(Debug, Clone, Error)]
pub enum EstimateError {
    /// No calibration baseline to derive parameters from
    #[error("Virtual sensor is not calibrated")]
    Uncalibrated,

    /// Model output unusable
    #[error("Degenerate estimate: {0}")]
    DegenerateEstimate(String),
}

/// Estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Throttle magnitude below which the throttle model is not used
    pub min_throttle: f64,
    /// Upper clamp on the vibration correction factor
    pub max_vibration_factor: f64,
    /// Weakest speed/vibration correlation the regression fallback accepts
    pub min_correlation: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_throttle: 0.05,
            max_vibration_factor: 4.0,
            min_correlation: 0.3,
        }
    }
}

/// Per-session parameters taken from the calibration baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorParams {
    pub mean_speed: f64,
    pub mean_throttle: f64,
    pub mean_vibration: f64,
    /// Speed/vibration correlation during calibration
    pub correlation: f64,
    /// Speed-on-vibration regression slope
    pub slope: f64,
    /// Speed-on-vibration regression intercept
    pub intercept: f64,
}

impl EstimatorParams {
    /// Extract parameters from a fitted baseline
    pub fn from_baseline(baseline: &CalibrationBaseline) -> Self {
        Self {
            mean_speed: baseline.speed.mean,
            mean_throttle: baseline.throttle.mean,
            mean_vibration: baseline.vibration.mean,
            correlation: baseline.speed_vibration_correlation,
            slope: baseline.speed_vibration_slope,
            intercept: baseline.speed_vibration_intercept,
        }
    }
}

/// Model that produced the estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    /// throttle x motor constant x vibration factor
    ThrottleModel,
    /// Speed-on-vibration regression line
    VibrationRegression,
    /// Model unusable; last trusted reading held
    LastTrusted,
}

/// Estimated speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Estimated speed (km/h), always finite and non-negative
    pub speed: f64,
    pub source: EstimateSource,
}

/// Virtual wheel-speed sensor
#[derive(Debug, Clone, Default)]
pub struct VirtualSensor {
    config: EstimatorConfig,
}

impl VirtualSensor {
    /// Create a new virtual sensor
    pub fn new(mut config: EstimatorConfig) -> Self {
        config.max_vibration_factor = config.max_vibration_factor.max(0.0);
        Self { config }
    }

    /// Estimate speed; never fails
    ///
    /// `recent_speeds` holds trusted readings, oldest first. When the model
    /// output is degenerate the newest usable one is returned instead.
    pub fn estimate(
        &self,
        params: Option<&EstimatorParams>,
        throttle_command: f64,
        vibration: f64,
        recent_speeds: &[f64],
    ) -> Estimate {
        match self.model_speed(params, throttle_command, vibration) {
            Ok(estimate) => estimate,
            Err(e) => {
                let speed = last_trusted(recent_speeds);
                match e {
                    // Expected on every healing cycle before the first calibration
                    EstimateError::Uncalibrated => {
                        debug!("{}; holding last trusted speed {:.1}", e, speed)
                    }
                    EstimateError::DegenerateEstimate(_) => {
                        warn!("{}; holding last trusted speed {:.1}", e, speed)
                    }
                }
                Estimate {
                    speed,
                    source: EstimateSource::LastTrusted,
                }
            }
        }
    }

    /// Run the calibrated model without any fallback
    pub fn model_speed(
        &self,
        params: Option<&EstimatorParams>,
        throttle_command: f64,
        vibration: f64,
    ) -> Result<Estimate, EstimateError> {
        let params = params.ok_or(EstimateError::Uncalibrated)?;

        let throttle_model_ready = params.mean_throttle.abs() > self.config.min_throttle;
        let estimate = if throttle_model_ready && throttle_command.abs() > self.config.min_throttle {
            if vibration <= 0.0 {
                return Err(EstimateError::DegenerateEstimate(
                    "zero vibration with non-zero throttle".to_string(),
                ));
            }
            let motor_constant = params.mean_speed / params.mean_throttle;
            Estimate {
                speed: throttle_command * motor_constant * self.vibration_factor(params, vibration),
                source: EstimateSource::ThrottleModel,
            }
        } else if params.correlation.abs() >= self.config.min_correlation {
            Estimate {
                speed: params.slope * vibration + params.intercept,
                source: EstimateSource::VibrationRegression,
            }
        } else {
            return Err(EstimateError::DegenerateEstimate(
                "no throttle input and vibration does not track speed".to_string(),
            ));
        };

        if !estimate.speed.is_finite() || estimate.speed < 0.0 {
            return Err(EstimateError::DegenerateEstimate(format!(
                "model produced {}",
                estimate.speed
            )));
        }
        Ok(estimate)
    }

    // Scales the throttle model by how far vibration sits from its baseline,
    // weighted by how strongly vibration tracked speed during calibration
    fn vibration_factor(&self, params: &EstimatorParams, vibration: f64) -> f64 {
        if params.mean_vibration <= 0.0 {
            return 1.0;
        }
        let rho = params.correlation.abs().min(1.0);
        let factor = 1.0 + rho * (vibration / params.mean_vibration - 1.0);
        if factor.is_nan() {
            return 1.0;
        }
        factor.clamp(0.0, self.config.max_vibration_factor)
    }
}

fn last_trusted(recent_speeds: &[f64]) -> f64 {
    recent_speeds
        .iter()
        .rev()
        .copied()
        .find(|speed| speed.is_finite() && *speed >= 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anomaly_scorer::ScorerConfig;
    use proptest::prelude::*;
    use telemetry::TelemetrySample;

    fn cruise_params() -> EstimatorParams {
        EstimatorParams {
            mean_speed: 50.0,
            mean_throttle: 0.6,
            mean_vibration: 0.05,
            correlation: 0.8,
            slope: 1000.0,
            intercept: 0.0,
        }
    }

    #[test]
    fn test_throttle_model_at_baseline() {
        let sensor = VirtualSensor::default();
        let estimate = sensor.estimate(Some(&cruise_params()), 0.6, 0.05, &[]);
        assert_eq!(estimate.source, EstimateSource::ThrottleModel);
        assert!((estimate.speed - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_vibration_raises_estimate() {
        let sensor = VirtualSensor::default();
        let calm = sensor.estimate(Some(&cruise_params()), 0.6, 0.05, &[]);
        let rough = sensor.estimate(Some(&cruise_params()), 0.6, 0.07, &[]);
        assert!(rough.speed > calm.speed);
    }

    #[test]
    fn test_zero_vibration_falls_back() {
        let sensor = VirtualSensor::default();
        let estimate = sensor.estimate(Some(&cruise_params()), 0.6, 0.0, &[48.0, 49.5]);
        assert_eq!(estimate.source, EstimateSource::LastTrusted);
        assert_eq!(estimate.speed, 49.5);
    }

    #[test]
    fn test_coasting_uses_regression() {
        let sensor = VirtualSensor::default();
        let estimate = sensor.estimate(Some(&cruise_params()), 0.0, 0.04, &[]);
        assert_eq!(estimate.source, EstimateSource::VibrationRegression);
        assert!((estimate.speed - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_uncalibrated_holds_last_speed() {
        let sensor = VirtualSensor::default();
        let estimate = sensor.estimate(None, 0.6, 0.05, &[30.0, f64::NAN]);
        assert_eq!(estimate.source, EstimateSource::LastTrusted);
        assert_eq!(estimate.speed, 30.0);
        assert_eq!(sensor.estimate(None, 0.6, 0.05, &[]).speed, 0.0);
        assert!(matches!(
            sensor.model_speed(None, 0.6, 0.05),
            Err(EstimateError::Uncalibrated)
        ));
    }

    #[test]
    fn test_params_from_baseline() {
        let samples: Vec<_> = (0..100)
            .map(|i| {
                let speed = 50.0 + (i as f64 * 0.7).sin();
                TelemetrySample::new(i as f64 * 0.1, speed, speed * 0.001, 0.6)
            })
            .collect();
        let baseline = CalibrationBaseline::fit(&samples, &ScorerConfig::default()).unwrap();
        let params = EstimatorParams::from_baseline(&baseline);
        assert!((params.mean_throttle - 0.6).abs() < 1e-9);
        assert!(params.correlation > 0.99);

        let sensor = VirtualSensor::default();
        let estimate = sensor.estimate(Some(&params), 0.6, params.mean_vibration, &[]);
        assert!((estimate.speed - params.mean_speed).abs() < 1e-6);
    }

    fn arb_params() -> impl Strategy<Value = EstimatorParams> {
        (
            0.0f64..300.0,
            -2.0f64..2.0,
            0.0f64..1.0,
            -1.0f64..1.0,
            -1e4f64..1e4,
            -100.0f64..100.0,
        )
            .prop_map(|(mean_speed, mean_throttle, mean_vibration, correlation, slope, intercept)| {
                EstimatorParams {
                    mean_speed,
                    mean_throttle,
                    mean_vibration,
                    correlation,
                    slope,
                    intercept,
                }
            })
    }

    proptest! {
        #[test]
        fn estimate_is_finite_and_non_negative(
            params in prop::option::of(arb_params()),
            throttle in 0.0f64..1e3,
            vibration in 0.0f64..1e3,
            history in prop::collection::vec(0.0f64..300.0, 0..10),
        ) {
            let sensor = VirtualSensor::default();
            let estimate = sensor.estimate(params.as_ref(), throttle, vibration, &history);
            prop_assert!(estimate.speed.is_finite());
            prop_assert!(estimate.speed >= 0.0);
        }
    }
}
