//! Score Processing Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A score processing error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for score processing.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every kind except [`Config`](Self::Config) and [`Startup`](Self::Startup)
/// is fatal to a single score only; the queue keeps running.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Storage was unavailable while reading what the score needs.
    #[display("transient failure while fetching score data")]
    TransientFetchFailure,
    /// Beatmap content needed for difficulty calculation is missing.
    #[display("content unavailable for beatmap {_0}")]
    ContentUnavailable(#[error(not(source))] u32),
    /// Difficulty attributes could not be produced.
    #[display("difficulty calculation failed")]
    Difficulty,
    /// The score can't have come from a real play, or references a beatmap
    /// that doesn't exist.
    #[display("invalid score: {_0}")]
    InvalidScore(#[error(not(source))] String),
    /// Processing results could not be written.
    #[display("failed to persist processing results")]
    Persistence,
    #[display("invalid configuration")]
    Config,
    /// A dependency needed to start processing could not be set up.
    #[display("startup failed: {_0}")]
    Startup(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientFetchFailure | Self::Persistence)
    }
}
