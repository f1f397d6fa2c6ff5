//! Engine Configuration

use anomaly_scorer::{CalibrationConfig, ScorerConfig};
use health_monitor::HysteresisConfig;
use rule_engine::RuleConfig;
use serde::{Deserialize, Serialize};
use virtual_sensor::EstimatorConfig;

/// Configuration for every stage of the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub calibration: CalibrationConfig,
    pub rules: RuleConfig,
    pub scorer: ScorerConfig,
    pub hysteresis: HysteresisConfig,
    pub estimator: EstimatorConfig,
    /// Trusted speed readings kept for the estimator fallback
    pub history_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),
            rules: RuleConfig::default(),
            scorer: ScorerConfig::default(),
            hysteresis: HysteresisConfig::default(),
            estimator: EstimatorConfig::default(),
            history_len: 50,
        }
    }
}
