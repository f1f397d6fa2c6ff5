//! Hysteresis Configuration

use serde::{Deserialize, Serialize};

/// Confirmation windows for entering and leaving the healing state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    /// Consecutive faulty samples, counting the one that raised suspicion,
    /// needed before healing starts
    pub suspect_confirmation: u32,
    /// Consecutive clean samples needed before healing ends
    pub recovery_confirmation: u32,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            suspect_confirmation: 2,
            recovery_confirmation: 2,
        }
    }
}
