//! CSV error types

use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur while loading CSV
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed record, including invalid UTF-8
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file does not fit in a worksheet
    #[error("Row {row}, column {column} is past the worksheet limits: {message}")]
    TooLarge {
        row: usize,
        column: usize,
        message: String,
    },
}
