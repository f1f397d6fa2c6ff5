//! Telemetry Error Types

use thiserror::Error;

/// Errors raised at the telemetry boundary
#[derive(Debug, Clone, Error)]
pub enum TelemetryError {
    /// Packet could not be decoded into a sample or command
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A required field was absent from the packet
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A numeric field was NaN or infinite
    #[error("{field} value {value} is not finite")]
    NonFinite { field: &'static str, value: f64 },

    /// Command could not be serialized
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::MalformedInput(err.to_string())
    }
}
