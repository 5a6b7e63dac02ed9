//! Graph error types

use sheetc_formula::FormulaError;
use thiserror::Error;

/// Result type for graph operations
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Errors raised while building or partitioning a dependency graph
///
/// Only [`GraphError::EmptyInput`] and [`GraphError::AlreadyPartitioned`] escape to
/// callers. The rest are raised per vertex and recorded as diagnostics.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The cell source had nothing to process
    #[error("No cells to process in sheet '{0}'")]
    EmptyInput(String),

    /// A same-sheet reference to a cell that does not exist
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// A name that is not in the named-range table
    #[error("Unknown name: {0}")]
    UnknownName(String),

    /// Formula could not be parsed
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Named-range definition could not be interpreted
    #[error(transparent)]
    Core(#[from] sheetc_core::Error),

    /// Classes are assigned once per graph
    #[error("Graph has already been partitioned")]
    AlreadyPartitioned,
}
