//! Symbolic Rule Engine
//!
//! Deterministic per-sample checks that catch physically impossible
//! telemetry, independent of any learned model.

mod config;
mod rules;

pub use config::RuleConfig;
pub use rules::RuleEngine;
