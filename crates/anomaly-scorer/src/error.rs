//! Scorer Error Types

use thiserror::Error;

/// Errors raised while building a calibration baseline
#[derive(Debug, Clone, Error)]
pub enum ScorerError {
    /// Not enough usable samples, or samples without variance
    #[error("Insufficient calibration data: {0}")]
    InsufficientData(String),

    /// Configuration value outside its valid range
    #[error("Invalid scorer configuration: {0}")]
    InvalidConfig(String),
}
