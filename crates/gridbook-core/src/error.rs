//! Error types for gridbook-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gridbook-core
///
/// All errors are raised synchronously by the operation that triggers them;
/// a failed mutation leaves the document unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// An index fell outside a bound range (pivot fields, sheet indices,
    /// row/column limits). Raised at the call that introduces the index,
    /// never deferred to save time.
    #[error("{what} index {index} out of range (max: {max})")]
    OutOfRange {
        what: &'static str,
        index: i64,
        max: i64,
    },

    /// Malformed input: unsupported charset code, font size below the
    /// minimum, invalid sheet name characters, and similar.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A resource that must be unique already exists (second comment at the
    /// same anchor, duplicate sheet or table name).
    #[error("Duplicate resource: {0}")]
    DuplicateResource(String),

    /// A required dependent row, cell, or part is absent where the caller
    /// explicitly demands presence.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// A range overlaps an existing merged region
    #[error("Range {0} overlaps an existing merged region")]
    MergedRegionOverlap(String),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),
}

impl Error {
    /// Shorthand for an [`Error::OutOfRange`] over a zero-based index.
    pub fn out_of_range(what: &'static str, index: i64, max: i64) -> Self {
        Error::OutOfRange { what, index, max }
    }

    /// Shorthand for an [`Error::InvalidArgument`].
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
