//! Database Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A database error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The database could not be reached or a query failed.
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// Stored data could not be converted to or from its domain type.
    #[display("invalid data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Busy or locked databases clear up on their own; broken rows don't.
        matches!(self, Self::Database)
    }
}
