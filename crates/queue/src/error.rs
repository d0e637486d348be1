//! Queue Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A queue error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for queue operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// Failures of individual items are never reported through this type; they
/// go to the processor's error observers.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request conflicts with the processor's current state (already
    /// running, or full in single-file mode). The loop itself is unaffected.
    #[display("invalid state: {_0}")]
    InvalidState(#[error(not(source))] &'static str),
    /// The queue backend could not be reached.
    #[display("queue backend error")]
    Backend,
    /// An item could not be encoded for the backend.
    #[display("queue item serialization error")]
    Serialization,
    /// An item was taken off the backend but could not be decoded. Holds the
    /// raw payload; the item is gone from the queue.
    #[display("undecodable queue item")]
    Undecodable(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::InvalidState("queue is full").to_string(), "invalid state: queue is full");
        assert!(ErrorKind::Backend.is_retryable());
        assert!(!ErrorKind::Serialization.is_retryable());
        assert!(!ErrorKind::InvalidState("running").is_retryable());
        assert!(!ErrorKind::Undecodable("{".to_string()).is_retryable());
    }
}
