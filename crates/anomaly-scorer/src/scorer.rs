//! Anomaly Scorer

use crate::baseline::CalibrationBaseline;
use crate::error::ScorerError;
use crate::forest::{ForestConfig, IsolationForest};
use crate::mahalanobis::MahalanobisModel;
use crate::relation::Residuals;
use serde::{Deserialize, Serialize};
use telemetry::{TelemetrySample, Verdict};
use tracing::{debug, info, warn};

/// Outlier model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    Mahalanobis,
    IsolationForest,
}

/// Anomaly scorer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Outlier model to fit
    pub model: ModelKind,
    /// Calibration-score percentile the cutoff is anchored on (0-1)
    pub cutoff_percentile: f64,
    /// Cutoff = q_p + margin * (q_p - median)
    pub cutoff_margin: f64,
    /// Mahalanobis ridge standard deviation, as a fraction of the calibration mean speed
    pub variance_floor_ratio: f64,
    /// A sample slower than this (km/h)...
    pub idle_speed: f64,
    /// ...and quieter than this (G) is a parked vehicle, never an anomaly
    pub idle_vibration: f64,
    /// Isolation forest parameters
    pub forest: ForestConfig,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Mahalanobis,
            cutoff_percentile: 0.99,
            cutoff_margin: 1.0,
            variance_floor_ratio: 0.01,
            idle_speed: 5.0,
            idle_vibration: 0.1,
            forest: ForestConfig::default(),
        }
    }
}

/// Fitted outlier model
#[derive(Debug, Clone)]
pub enum OutlierModel {
    Mahalanobis(MahalanobisModel),
    IsolationForest(IsolationForest),
}

impl OutlierModel {
    /// Fit the configured model family on calibration residuals
    ///
    /// `speed_scale` is the calibration operating speed; it sizes the
    /// Mahalanobis ridge.
    pub fn fit(
        rows: &[Residuals],
        config: &ScorerConfig,
        speed_scale: f64,
    ) -> Result<Self, ScorerError> {
        match config.model {
            ModelKind::Mahalanobis => {
                MahalanobisModel::fit(rows, config.variance_floor_ratio * speed_scale)
                    .map(OutlierModel::Mahalanobis)
            }
            ModelKind::IsolationForest => {
                IsolationForest::fit(rows, &config.forest).map(OutlierModel::IsolationForest)
            }
        }
    }

    /// Anomaly score; larger is more anomalous
    pub fn score(&self, row: &Residuals) -> f64 {
        match self {
            OutlierModel::Mahalanobis(model) => model.score(row),
            OutlierModel::IsolationForest(forest) => forest.score(row),
        }
    }

    /// Model family
    pub fn kind(&self) -> ModelKind {
        match self {
            OutlierModel::Mahalanobis(_) => ModelKind::Mahalanobis,
            OutlierModel::IsolationForest(_) => ModelKind::IsolationForest,
        }
    }
}

/// Statistical detector
///
/// Until [`AnomalyScorer::fit`] succeeds every sample scores `Normal`:
/// statistical detection is unavailable rather than guessing.
pub struct AnomalyScorer {
    config: ScorerConfig,
    baseline: Option<CalibrationBaseline>,
}

impl AnomalyScorer {
    /// Create an unfitted scorer
    pub fn new(config: ScorerConfig) -> Result<Self, ScorerError> {
        if !(0.0..=1.0).contains(&config.cutoff_percentile) {
            return Err(ScorerError::InvalidConfig(format!(
                "cutoff_percentile {} is outside [0, 1]",
                config.cutoff_percentile
            )));
        }
        if config.cutoff_margin < 0.0 || config.variance_floor_ratio < 0.0 {
            return Err(ScorerError::InvalidConfig(
                "cutoff_margin and variance_floor_ratio must be non-negative".to_string(),
            ));
        }
        info!("Creating anomaly scorer with config: {:?}", config);
        Ok(Self {
            config,
            baseline: None,
        })
    }

    /// Fit the baseline from calibration samples
    ///
    /// On failure any previous baseline is kept untouched.
    pub fn fit(&mut self, samples: &[TelemetrySample]) -> Result<&CalibrationBaseline, ScorerError> {
        match CalibrationBaseline::fit(samples, &self.config) {
            Ok(baseline) => {
                info!("Anomaly scorer active ({:?})", self.config.model);
                let baseline: &CalibrationBaseline = self.baseline.insert(baseline);
                Ok(baseline)
            }
            Err(e) => {
                warn!("Anomaly scorer fit failed: {}", e);
                Err(e)
            }
        }
    }

    /// Score a sample against the baseline
    pub fn score(&self, sample: &TelemetrySample) -> Verdict {
        let Some(baseline) = &self.baseline else {
            return Verdict::Normal;
        };

        if sample.speed < self.config.idle_speed && sample.vibration < self.config.idle_vibration {
            return Verdict::Normal;
        }

        let score = baseline.score(&sample.features());
        if score > baseline.cutoff {
            debug!(
                "Statistical anomaly at t={:.3}: score {:.3} > cutoff {:.3}",
                sample.timestamp, score, baseline.cutoff
            );
            Verdict::anomaly(score, baseline.cutoff)
        } else {
            Verdict::Normal
        }
    }

    /// Raw score, if fitted
    pub fn raw_score(&self, sample: &TelemetrySample) -> Option<f64> {
        self.baseline
            .as_ref()
            .map(|baseline| baseline.score(&sample.features()))
    }

    /// Whether a baseline is in place
    pub fn is_fitted(&self) -> bool {
        self.baseline.is_some()
    }

    /// Current baseline
    pub fn baseline(&self) -> Option<&CalibrationBaseline> {
        self.baseline.as_ref()
    }

    /// Scorer configuration
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Destroy the baseline
    pub fn reset(&mut self) {
        if self.baseline.take().is_some() {
            info!("Anomaly scorer baseline discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cruise(n: usize) -> Vec<TelemetrySample> {
        (0..n)
            .map(|i| {
                let speed = 50.0 + 0.3 * (i as f64 * 0.7).sin();
                let vibration = 0.001 * speed + 0.0005 * (i as f64 * 1.3).cos();
                TelemetrySample::new(i as f64 * 0.02, speed, vibration, 0.6)
            })
            .collect()
    }

    fn fitted(config: ScorerConfig) -> AnomalyScorer {
        let mut scorer = AnomalyScorer::new(config).unwrap();
        scorer.fit(&cruise(300)).unwrap();
        scorer
    }

    #[test]
    fn test_cruise_sample_is_normal() {
        let scorer = fitted(ScorerConfig::default());
        let sample = TelemetrySample::new(100.0, 50.0, 0.05, 0.6);
        assert_eq!(scorer.score(&sample), Verdict::Normal);
    }

    #[test]
    fn test_speed_drift_is_anomalous() {
        let scorer = fitted(ScorerConfig::default());
        let sample = TelemetrySample::new(100.0, 58.0, 0.05, 0.6);
        assert!(matches!(
            scorer.score(&sample),
            Verdict::Fault(telemetry::FaultReason::StatisticalAnomaly { .. })
        ));
    }

    #[test]
    fn test_idle_gate() {
        let scorer = fitted(ScorerConfig::default());
        let stalled = TelemetrySample::new(100.0, 0.0, 0.05, 0.6);
        assert_eq!(scorer.score(&stalled), Verdict::Normal);
        assert!(scorer.raw_score(&stalled).unwrap() > scorer.baseline().unwrap().cutoff);
    }

    #[test]
    fn test_speed_change_with_matching_vibration_is_normal() {
        let scorer = fitted(ScorerConfig::default());
        for k in 1..=40 {
            let speed = 50.0 + 0.5 * k as f64;
            let sample = TelemetrySample::new(100.0, speed, 0.001 * speed, 0.6);
            assert_eq!(scorer.score(&sample), Verdict::Normal, "{} km/h", speed);
        }
    }

    #[test]
    fn test_throttle_constant_in_calibration_is_ignored() {
        let scorer = fitted(ScorerConfig::default());
        let sample = TelemetrySample::new(100.0, 50.0, 0.05, 0.65);
        assert_eq!(scorer.score(&sample), Verdict::Normal);
    }

    #[test]
    fn test_isolation_forest_flags_drift() {
        let scorer = fitted(ScorerConfig {
            model: ModelKind::IsolationForest,
            ..Default::default()
        });
        let drifted = TelemetrySample::new(100.0, 58.0, 0.05, 0.6);
        assert!(matches!(
            scorer.score(&drifted),
            Verdict::Fault(telemetry::FaultReason::StatisticalAnomaly { .. })
        ));
    }

    #[test]
    fn test_isolation_forest_flags_far_outlier() {
        let scorer = fitted(ScorerConfig {
            model: ModelKind::IsolationForest,
            ..Default::default()
        });
        assert_eq!(
            scorer.baseline().unwrap().model().kind(),
            ModelKind::IsolationForest
        );
        let far = TelemetrySample::new(100.0, 140.0, 0.6, 1.0);
        let near = TelemetrySample::new(100.0, 50.0, 0.05, 0.6);
        assert!(scorer.raw_score(&far).unwrap() > scorer.raw_score(&near).unwrap());
    }

    #[test]
    fn test_failed_fit_keeps_scorer_unfitted() {
        let mut scorer = AnomalyScorer::new(ScorerConfig::default()).unwrap();
        assert!(scorer.fit(&cruise(1)).is_err());
        assert!(!scorer.is_fitted());
    }

    #[test]
    fn test_reset_discards_baseline() {
        let mut scorer = fitted(ScorerConfig::default());
        scorer.reset();
        assert!(!scorer.is_fitted());
        let sample = TelemetrySample::new(100.0, 500.0, 5.0, 1.0);
        assert_eq!(scorer.score(&sample), Verdict::Normal);
    }

    #[test]
    fn test_invalid_percentile() {
        let config = ScorerConfig {
            cutoff_percentile: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            AnomalyScorer::new(config),
            Err(ScorerError::InvalidConfig(_))
        ));
    }

    proptest! {
        #[test]
        fn unfitted_scorer_never_faults(
            speed in -1e6f64..1e6,
            vibration in -1e3f64..1e3,
            throttle in -10.0f64..10.0,
        ) {
            let scorer = AnomalyScorer::new(ScorerConfig::default()).unwrap();
            let sample = TelemetrySample::new(0.0, speed, vibration, throttle);
            prop_assert_eq!(scorer.score(&sample), Verdict::Normal);
        }
    }
}
