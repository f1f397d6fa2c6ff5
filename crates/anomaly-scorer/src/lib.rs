//! Statistical Anomaly Scorer
//!
//! Learns how speed relates to throttle command and vibration during a
//! calibration window, then scores how far every later sample's speed sits
//! from the speed those signals imply. Two interchangeable models score the
//! residuals: Mahalanobis distance over a regularized covariance, and an
//! isolation forest.

mod baseline;
mod calibration;
mod error;
mod forest;
mod mahalanobis;
mod relation;
mod scorer;
mod statistics;

pub use baseline::CalibrationBaseline;
pub use calibration::{CalibrationBuffer, CalibrationConfig, CalibrationStatus};
pub use error::ScorerError;
pub use forest::{ForestConfig, IsolationForest};
pub use mahalanobis::MahalanobisModel;
pub use relation::{residual, Residuals, SpeedRelation, RESIDUAL_COUNT};
pub use scorer::{AnomalyScorer, ModelKind, OutlierModel, ScorerConfig};
pub use statistics::{correlation, covariance, percentile, FeatureStats};

/// Number of features per sample: throttle, vibration, speed
pub const FEATURE_COUNT: usize = 3;

/// Feature indices into [`telemetry::TelemetrySample::features`]
pub mod feature {
    pub const THROTTLE: usize = 0;
    pub const VIBRATION: usize = 1;
    pub const SPEED: usize = 2;
}
