//! Error types for sheetc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while addressing or populating a workbook
#[derive(Debug, Error)]
pub enum Error {
    /// Text that is not an A1-style cell or range reference
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row number out of bounds (1-based)
    #[error("Row {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    #[error("Column {0} out of bounds (max: {1} columns)")]
    ColumnOutOfBounds(String, u16),

    /// Active sheet index past the end of the workbook
    #[error("Sheet index {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// A second sheet with the same (case-insensitive) name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Defined name that is malformed or points nowhere
    #[error("Invalid named range: {0}")]
    InvalidName(String),
}
