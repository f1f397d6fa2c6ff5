//! Speed Relation
//!
//! Speed is compared against the speed the other signals imply, not against
//! the calibration operating point. A vehicle that speeds up with matching
//! vibration stays on the relation; a speed reading that walks away from it
//! does not.

use crate::statistics::FeatureStats;
use crate::{feature, FEATURE_COUNT};

/// Number of residual components
pub const RESIDUAL_COUNT: usize = 2;

/// Residual row scored by the outlier models
pub type Residuals = [f64; RESIDUAL_COUNT];

/// Residual indices into [`Residuals`]
pub mod residual {
    /// Speed minus the vibration-implied speed
    pub const VIBRATION: usize = 0;
    /// Speed minus the throttle-implied speed
    pub const THROTTLE: usize = 1;
}

/// Proportional speed relations learned from a calibration window
///
/// A signal that stayed constant during calibration says nothing about
/// speed and is left out; its residual is always zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRelation {
    mean_speed: f64,
    vibration_gain: Option<f64>,
    throttle_gain: Option<f64>,
}

impl SpeedRelation {
    /// Learn the relations from per-feature calibration statistics
    pub fn fit(throttle: &FeatureStats, vibration: &FeatureStats, speed: &FeatureStats) -> Self {
        let gain = |stats: &FeatureStats| {
            (!stats.is_constant() && stats.mean.abs() > f64::EPSILON)
                .then(|| speed.mean / stats.mean)
        };
        Self {
            mean_speed: speed.mean,
            vibration_gain: gain(vibration),
            throttle_gain: gain(throttle),
        }
    }

    /// Residuals of a `(throttle, vibration, speed)` feature row
    ///
    /// Without a vibration relation the first component falls back to the
    /// deviation from the calibration mean speed.
    pub fn residuals(&self, features: &[f64; FEATURE_COUNT]) -> Residuals {
        let speed = features[feature::SPEED];
        let mut out = [0.0; RESIDUAL_COUNT];
        out[residual::VIBRATION] = match self.vibration_gain {
            Some(gain) => speed - gain * features[feature::VIBRATION],
            None => speed - self.mean_speed,
        };
        if let Some(gain) = self.throttle_gain {
            out[residual::THROTTLE] = speed - gain * features[feature::THROTTLE];
        }
        out
    }

    /// Speed per unit of vibration, when vibration varied
    pub fn vibration_gain(&self) -> Option<f64> {
        self.vibration_gain
    }

    /// Speed per unit of throttle, when throttle varied
    pub fn throttle_gain(&self) -> Option<f64> {
        self.throttle_gain
    }

    /// Calibration mean speed
    pub fn mean_speed(&self) -> f64 {
        self.mean_speed
    }
}
