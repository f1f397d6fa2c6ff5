//! Calibration Baseline

use crate::error::ScorerError;
use crate::scorer::{OutlierModel, ScorerConfig};
use crate::relation::{Residuals, SpeedRelation};
use crate::statistics::{correlation, covariance, percentile, FeatureStats};
use crate::{feature, FEATURE_COUNT};
use telemetry::TelemetrySample;
use tracing::info;

/// Statistical picture of trusted operation, built once per calibration
#[derive(Debug, Clone)]
pub struct CalibrationBaseline {
    /// Samples the baseline was fitted on
    pub sample_count: usize,
    /// Throttle command statistics
    pub throttle: FeatureStats,
    /// Vibration statistics
    pub vibration: FeatureStats,
    /// Speed statistics
    pub speed: FeatureStats,
    /// Pearson correlation between speed and vibration
    pub speed_vibration_correlation: f64,
    /// Slope of the least-squares line speed = slope * vibration + intercept
    pub speed_vibration_slope: f64,
    /// Intercept of the same line
    pub speed_vibration_intercept: f64,
    /// Relations the outlier model scores residuals against
    pub relation: SpeedRelation,
    /// Median anomaly score over the calibration set
    pub median_score: f64,
    /// Score above which a sample is anomalous
    pub cutoff: f64,
    model: OutlierModel,
}

impl CalibrationBaseline {
    /// Fit the outlier model and summary statistics
    pub fn fit(samples: &[TelemetrySample], config: &ScorerConfig) -> Result<Self, ScorerError> {
        if samples.len() < 2 {
            return Err(ScorerError::InsufficientData(format!(
                "{} calibration samples",
                samples.len()
            )));
        }

        let rows: Vec<[f64; FEATURE_COUNT]> = samples.iter().map(|s| s.features()).collect();
        let column = |j: usize| -> Vec<f64> { rows.iter().map(|row| row[j]).collect() };
        let throttle_values = column(feature::THROTTLE);
        let vibration_values = column(feature::VIBRATION);
        let speed_values = column(feature::SPEED);

        let throttle = FeatureStats::compute(&throttle_values);
        let vibration = FeatureStats::compute(&vibration_values);
        let speed = FeatureStats::compute(&speed_values);

        if speed.is_constant() && vibration.is_constant() {
            return Err(ScorerError::InsufficientData(
                "speed and vibration did not vary during calibration".to_string(),
            ));
        }

        let relation = SpeedRelation::fit(&throttle, &vibration, &speed);
        let residuals: Vec<Residuals> = rows.iter().map(|row| relation.residuals(row)).collect();
        let model = OutlierModel::fit(&residuals, config, speed.mean.abs())?;

        let scores: Vec<f64> = residuals.iter().map(|r| model.score(r)).collect();
        let upper = percentile(&scores, config.cutoff_percentile);
        let median_score = percentile(&scores, 0.5);
        let cutoff = upper + config.cutoff_margin * (upper - median_score);

        let (slope, intercept) = if vibration.variance > 0.0 {
            let slope = covariance(&speed_values, &vibration_values) / vibration.variance;
            (slope, speed.mean - slope * vibration.mean)
        } else {
            (0.0, speed.mean)
        };

        let baseline = Self {
            sample_count: samples.len(),
            throttle,
            vibration,
            speed,
            speed_vibration_correlation: correlation(&speed_values, &vibration_values),
            speed_vibration_slope: slope,
            speed_vibration_intercept: intercept,
            relation,
            median_score,
            cutoff,
            model,
        };

        info!(
            "Baseline fitted on {} samples: speed {:.1}±{:.2}, vibration {:.4}±{:.4}, rho={:.2}, gains v={:?} t={:?}, cutoff={:.3}",
            baseline.sample_count,
            baseline.speed.mean,
            baseline.speed.std_dev,
            baseline.vibration.mean,
            baseline.vibration.std_dev,
            baseline.speed_vibration_correlation,
            baseline.relation.vibration_gain(),
            baseline.relation.throttle_gain(),
            baseline.cutoff
        );

        Ok(baseline)
    }

    /// Raw anomaly score of a feature row
    pub fn score(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        self.model.score(&self.relation.residuals(features))
    }

    /// Mean speed per unit of throttle, if the calibration saw any throttle
    pub fn speed_throttle_ratio(&self) -> Option<f64> {
        (self.throttle.mean.abs() > f64::EPSILON).then(|| self.speed.mean / self.throttle.mean)
    }

    /// Fitted outlier model
    pub fn model(&self) -> &OutlierModel {
        &self.model
    }
}
