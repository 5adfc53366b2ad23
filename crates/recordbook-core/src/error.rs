//! Error types for recordbook-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a workbook model
#[derive(Debug, Error)]
pub enum Error {
    /// A field value has no cell representation
    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(String),

    /// A sheet was built without any mapped column
    #[error("Sheet '{0}' has no columns defined")]
    NoColumnsDefined(String),

    /// Sheet name already used in the workbook (case-insensitive)
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Sheet name is empty, too long, or contains a reserved character
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u16, u16),

    /// Style index does not resolve in the style table
    #[error("Invalid style index: {0}")]
    InvalidStyleIndex(u32),

    /// Merged range overlaps an existing merged range
    #[error("Range {0} overlaps an existing merged region")]
    MergedCellConflict(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
