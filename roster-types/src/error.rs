//! Error types for roster-types.

use thiserror::Error;

/// Errors produced while building or (de)serializing roster values.
#[derive(Debug, Error)]
pub enum TypesError {
    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Identifier was empty or blank
    #[error("invalid identifier: {0:?}")]
    InvalidId(String),

    /// Payload decoded but carried an impossible value
    #[error("invalid data: {0}")]
    InvalidData(String),
}
