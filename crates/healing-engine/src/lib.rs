//! Self-Healing Engine
//!
//! Runs every telemetry sample through the symbolic rules and the
//! calibrated anomaly scorer, fuses both verdicts in the health monitor,
//! and substitutes the virtual speed estimate while the sensor is unhealthy.
//!
//! The engine is synchronous and performs no I/O: one instance per stream,
//! one sample processed to completion at a time.

mod config;
mod engine;
mod error;
mod output;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use output::{CalibrationProgress, CorrectedTelemetry, EngineOutput, Verdicts};

pub use anomaly_scorer::{CalibrationConfig, ForestConfig, ModelKind, ScorerConfig};
pub use health_monitor::{HealthState, HysteresisConfig, Transition};
pub use rule_engine::RuleConfig;
pub use virtual_sensor::{Estimate, EstimateSource, EstimatorConfig};
