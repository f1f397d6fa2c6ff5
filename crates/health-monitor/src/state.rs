//! Health States

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health of the wheel-speed sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthState {
    #[default]
    Normal,
    Suspect,
    Healing,
    Recovered,
}

impl HealthState {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Normal => "NORMAL",
            HealthState::Suspect => "SUSPECT",
            HealthState::Healing => "HEALING",
            HealthState::Recovered => "RECOVERED",
        }
    }

    /// Whether the virtual estimate replaces the sensor reading
    pub fn uses_estimate(&self) -> bool {
        matches!(self, HealthState::Healing | HealthState::Recovered)
    }

    /// Numeric code for gauges
    pub fn code(&self) -> u8 {
        match self {
            HealthState::Normal => 0,
            HealthState::Suspect => 1,
            HealthState::Healing => 2,
            HealthState::Recovered => 3,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change of health state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: HealthState,
    pub to: HealthState,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}
