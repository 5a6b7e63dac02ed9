//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while parsing a formula
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Range shape the graph cannot expand, such as `A:A` or `1:1`
    #[error("Unsupported range shape: {0}")]
    UnsupportedRange(String),

    /// Nesting deeper than the parser accepts
    #[error("Formula nests deeper than {0} levels")]
    TooDeep(usize),

    /// Reference to invalid cell
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}
