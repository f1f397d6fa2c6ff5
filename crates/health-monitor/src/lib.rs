//! Sensor Health Monitor
//!
//! Fuses the rule-engine and anomaly-scorer verdicts for each sample,
//! applies hysteresis, and decides when healing starts and ends.

mod config;
mod counter;
mod machine;
mod state;

pub use config::HysteresisConfig;
pub use counter::BoundedCounter;
pub use machine::{HealthMonitor, StepOutcome};
pub use state::{HealthState, Transition};
