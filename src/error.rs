//! Error types for the purge/mesh transform.

use std::num::ParseFloatError;

use thiserror::Error;

/// Errors that can occur while transforming a program.
#[derive(Error, Debug)]
pub enum Error {
    /// A token matched a numeric pattern but did not parse as a float.
    #[error("invalid number {token:?} on line {line}: {source}")]
    InvalidNumber {
        /// 1-based line number within the whole document.
        line: usize,
        /// The captured text.
        token: String,
        /// Underlying parse failure.
        #[source]
        source: ParseFloatError,
    },

    /// Purge settings are out of range.
    #[error("invalid purge config: {0}")]
    InvalidConfig(String),
}

/// Result type for purge/mesh operations.
pub type Result<T> = std::result::Result<T, Error>;
