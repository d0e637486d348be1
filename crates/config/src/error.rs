//! Configuration Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An explicitly requested configuration file does not exist.
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The file extension doesn't name a supported format.
    #[display("unsupported configuration format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// A source could not be parsed, or values have the wrong type.
    #[display("failed to load configuration")]
    Load,
    /// Values parsed fine but don't make sense together.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] &'static str),
}
