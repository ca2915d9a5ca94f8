//! Error types for blockfilter.
//!
//! Building and querying filters never fail; errors only come out of
//! configuration validation.

use thiserror::Error;

/// The result type used throughout blockfilter.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for blockfilter operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An invalid argument was provided.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
