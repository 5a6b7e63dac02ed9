//! Error types for the generation pipeline

use sheetc_codegen::CodegenError;
use sheetc_graph::GraphError;
use thiserror::Error;

/// Result type for [`crate::generate`]
pub type GenerateResult<T> = std::result::Result<T, GenerateError>;

/// Conditions that stop generation
///
/// Everything else, from unparsable formulas to cycles, is reported through
/// [`crate::Generation::diagnostics`] and still yields a program.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The workbook has no sheet at the active index
    #[error("Workbook has no active sheet")]
    NoActiveSheet,

    /// The active sheet holds no cells
    #[error("Sheet '{0}' is empty")]
    EmptySheet(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Core(#[from] sheetc_core::Error),

    /// Loading an input file failed
    #[cfg(feature = "csv")]
    #[error(transparent)]
    Csv(#[from] sheetc_csv::CsvError),
}
