//! Beatmap Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A beatmap resolution error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for beatmap resolution.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// A beatmap or attribute set that simply doesn't exist is never an error;
/// it resolves to `None`.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Storage or network was unavailable while resolving.
    #[display("transient failure while fetching beatmap data")]
    TransientFetchFailure,
    /// Beatmap content was requested but came back empty.
    #[display("content unavailable for beatmap {_0}")]
    ContentUnavailable(#[error(not(source))] u32),
    /// The difficulty calculator rejected the beatmap content.
    #[display("difficulty calculation failed")]
    Calculation,
    /// Stored beatmap data could not be understood.
    #[display("invalid beatmap data")]
    InvalidData,
    /// The performance blacklist could not be loaded; the store cannot
    /// operate without it.
    #[display("performance blacklist unavailable")]
    BlacklistUnavailable,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientFetchFailure | Self::BlacklistUnavailable)
    }
}
