//! Rule thresholds

use serde::{Deserialize, Serialize};

/// Rule engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Speed below which the vehicle counts as stationary (km/h)
    pub paradox_speed: f64,

    /// Vibration a stationary vehicle must not exceed (G)
    pub vibration_threshold: f64,

    /// Identical consecutive speed readings tolerated before the signal counts as frozen
    pub freeze_window: u32,

    /// Vibration must be above this for a repeated speed to count as frozen
    pub frozen_min_vibration: f64,

    /// Previous speed above which a drop to standstill in one sample is impossible (km/h)
    pub sudden_stop_from: Option<f64>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            paradox_speed: 1.0,
            vibration_threshold: 0.02,
            freeze_window: 10,
            frozen_min_vibration: 0.0,
            sudden_stop_from: None,
        }
    }
}

impl RuleConfig {
    /// Config with every rule enabled, including the sudden-stop check at 20 km/h
    pub fn strict() -> Self {
        Self {
            freeze_window: 5,
            sudden_stop_from: Some(20.0),
            ..Default::default()
        }
    }
}
