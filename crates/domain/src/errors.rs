//! Domain error types shared across all GraphCal crates.

use thiserror::Error;

/// Top-level error type for GraphCal operations.
///
/// Transport and protocol failures surface as variants of this enum;
/// per-item batch failures are represented as data
/// ([`crate::types::OutcomeKind::Error`]) and never raised from a batch
/// call.
#[derive(Debug, Error)]
pub enum GraphCalError {
    /// Transport/HTTP failure, after retry exhaustion for reads or
    /// immediately for writes.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Feed pagination or parsing failure; carries the vendor-reported
    /// OData error message when one was present.
    #[error("Read error: {0}")]
    Read(String),

    /// A request was built without an access token.
    #[error("No access token set on request")]
    MissingToken,

    /// Token provider failure.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Caller misconfiguration detected before any network call.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Caller-supplied value rejected by domain validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Batch headers were never applied, so no multipart boundary exists.
    #[error("Batch request has no multipart boundary")]
    BatchBoundaryMissing,

    /// A batch call was issued with no mutations.
    #[error("Batch request contains no operations")]
    BatchRequestEmpty,

    /// More mutations were submitted than one batch call permits.
    #[error("Batch limit exceeded: {submitted} operations submitted, limit is {limit}")]
    BatchLimitExceeded { submitted: usize, limit: usize },

    /// JSON (de)serialization failure outside the lenient batch paths.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for GraphCal operations
pub type Result<T> = std::result::Result<T, GraphCalError>;

impl From<serde_json::Error> for GraphCalError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
