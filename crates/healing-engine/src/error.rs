//! Engine Error Types

use anomaly_scorer::ScorerError;
use thiserror::Error;

/// Errors returned by the engine
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Sample carries non-finite values
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Timestamp did not advance past the last accepted sample
    #[error("Out-of-order sample: timestamp {timestamp} is not after {previous}")]
    OutOfOrderSample { timestamp: f64, previous: f64 },

    /// Invalid scorer configuration
    #[error("Scorer error: {0}")]
    Scorer(#[from] ScorerError),
}
