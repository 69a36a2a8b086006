//! Error type shared by every module of the crate.

use thiserror::Error;

/// The unified error type for the `date_bucketizer` crate.
#[derive(Debug, Error)]
pub enum BucketizerError {
    /// An argument was outside the accepted set (unknown granularity, inverted range).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A conversion needed a bound that is neither set nor supplied as a fallback.
    #[error("Precondition failed: {0}")]
    Precondition(&'static str),

    /// Date arithmetic left the range chrono can represent.
    #[error("Date out of range: {0}")]
    OutOfRange(String),

    /// A timestamp string could not be parsed.
    #[error("Invalid timestamp {input:?}: {message}")]
    Parse {
        /// The offending input.
        input: String,
        /// What went wrong.
        message: String,
    },

    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BucketizerError>;
