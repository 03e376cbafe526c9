//! Error types for s3conn-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for s3conn-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for s3conn operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid bucket or key
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication or permission failure
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Object key does not exist
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidPath(_) | Error::InvalidUrl(_) => 2, // UsageError
            Error::Network(_) => 3,                                               // NetworkError
            Error::Auth(_) => 4,                                                  // AuthError
            Error::BucketNotFound(_) | Error::ObjectNotFound(_) => 5,             // NotFound
            _ => 1,                                                               // GeneralError
        }
    }
}
