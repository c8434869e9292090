//! Error types for ksql-link.
//!
//! Every fallible operation in the crate returns [`Result<T>`]. Server-reported
//! query failures are carried as a structured [`QueryStreamError`] so callers
//! can inspect the code and type tag the server assigned.

use thiserror::Error;

use crate::models::QueryStreamErrorMetadata;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KsqlLinkError>;

/// Error raised when a query stream's header metadata reports a failure.
///
/// Mirrors the server's error frame: `@type`, `error_code` and `message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (error_code={error_code}, type={error_type})")]
pub struct QueryStreamError {
    /// Server-assigned classification, e.g. `statement_error`
    pub error_type: String,

    /// Server-defined numeric code, e.g. `40001`
    pub error_code: i64,

    /// Human-readable message
    pub message: String,
}

impl QueryStreamError {
    pub fn new(error_type: impl Into<String>, error_code: i64, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            error_code,
            message: message.into(),
        }
    }
}

impl From<&QueryStreamErrorMetadata> for QueryStreamError {
    fn from(meta: &QueryStreamErrorMetadata) -> Self {
        Self::new(meta.error_type.clone(), meta.error_code, meta.message.clone())
    }
}

/// Errors that can occur while talking to a ksqlDB server.
#[derive(Error, Debug)]
pub enum KsqlLinkError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// HTTP/2 failure surfaced as-is from the transport.
    #[error("Transport error: {0}")]
    Transport(#[from] h2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Query stream error: {0}")]
    QueryStream(#[from] QueryStreamError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Server error ({status_code}): {message}")]
    ServerError { status_code: u16, message: String },
}

impl KsqlLinkError {
    /// Returns the structured server error if this is a query stream failure.
    pub fn query_stream_error(&self) -> Option<&QueryStreamError> {
        match self {
            Self::QueryStream(err) => Some(err),
            _ => None,
        }
    }
}
