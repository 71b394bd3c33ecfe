//! Error types for backlog-pilot.

use thiserror::Error;

/// Main error type for backlog-pilot operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied an unusable argument (e.g. a non-positive limit)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration or project scope could not be resolved
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// API returned an error
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Map a non-2xx HTTP status to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Error::Auth(if message.is_empty() {
                format!("request rejected with status {}", status)
            } else {
                message
            }),
            _ => Error::Api { status, message },
        }
    }
}

/// Result type alias for backlog-pilot operations.
pub type Result<T> = std::result::Result<T, Error>;
