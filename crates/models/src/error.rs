//! Model Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A model error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for model conversions.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value could not be converted into its domain representation.
    #[display("failed to parse field '{field}', found value: {value}")]
    ParseError {
        /// The field that failed to parse.
        field: &'static str,
        /// Details about the parsing failure.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Stored or submitted data is either valid or it isn't.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        let kind = ErrorKind::ParseError {
            field: "ruleset",
            value: "7".to_string(),
        };
        assert_eq!(kind.to_string(), "failed to parse field 'ruleset', found value: 7");
        assert!(!kind.is_retryable());
    }
}
