//! Engine Output

use health_monitor::{HealthState, Transition};
use serde::{Deserialize, Serialize};
use telemetry::{Command, FaultReason, TelemetrySample, Verdict};
use virtual_sensor::Estimate;

/// Both detector verdicts for one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdicts {
    pub rule: Verdict,
    pub anomaly: Verdict,
}

impl Verdicts {
    /// Neither detector fired
    pub fn is_clean(&self) -> bool {
        !self.rule.is_fault() && !self.anomaly.is_fault()
    }

    /// Reasons of every active fault, rule first
    pub fn reasons(&self) -> Vec<FaultReason> {
        [self.rule.reason(), self.anomaly.reason()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Where the statistical detector stands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CalibrationProgress {
    /// Still learning the baseline; statistical detection is off
    Collecting { remaining_secs: f64, collected: usize },
    /// Baseline in place
    Calibrated { sample_count: usize },
}

impl CalibrationProgress {
    pub fn is_calibrated(&self) -> bool {
        matches!(self, CalibrationProgress::Calibrated { .. })
    }
}

/// Telemetry record as published after fault handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedTelemetry {
    /// Input sample; speed is the virtual estimate while healing
    pub sample: TelemetrySample,
    /// Speed as reported by the sensor
    pub raw_speed: f64,
    pub state: HealthState,
    pub verdicts: Verdicts,
    /// Present while the estimate replaces the sensor
    pub estimate: Option<Estimate>,
    pub calibration: CalibrationProgress,
}

impl CorrectedTelemetry {
    /// Whether `sample.speed` is an estimate rather than the sensor reading
    pub fn is_substituted(&self) -> bool {
        self.estimate.is_some()
    }
}

/// Everything produced by one call to [`crate::Engine::process`]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub telemetry: CorrectedTelemetry,
    pub transition: Option<Transition>,
    /// Command for the vehicle, at most one per sample
    pub command: Option<Command>,
}
