//! # sheetc
//!
//! Compiles the formulas of a spreadsheet into Rust source.
//!
//! Every formula cell becomes a statement and every input cell a field. Cells
//! only one output depends on are grouped in that output's own struct; cells
//! several outputs share go to a `Global` struct, and cells read from other
//! sheets to an `External` one. The generated code links against
//! `sheetc-runtime`.
//!
//! ## Example
//!
//! ```rust
//! use sheetc::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 5.0).unwrap();
//! sheet.set_cell_formula("B1", "=A1*2").unwrap();
//!
//! let generation = workbook.generate(&GenerateOptions::default()).unwrap();
//! assert!(generation.source.contains("let b1: f64 = a1 * 2.0;"));
//! assert!(!generation.diagnostics.has_errors());
//! ```

pub mod error;
pub mod generate;
pub mod prelude;

pub use error::{GenerateError, GenerateResult};
pub use generate::{
    generate, generate_with, GenerateOptions, Generation, GenerationStats, WorkbookGenerateExt,
};

// Re-export core types
pub use sheetc_core::{
    CellAddress, CellError, CellRange, CellType, CellValue, NameScope, NamedRange, Workbook,
    Worksheet, MAX_COLS, MAX_ROWS,
};

// Re-export pipeline stages
pub use sheetc_codegen::{
    build_program, CodeEmitter, CodegenOptions, Program, RustEmitter, TypeTable,
};
pub use sheetc_formula::{parse_formula, FormulaError, FormulaExpr, FunctionRegistry};
pub use sheetc_graph::{
    Class, ClassKind, ClassPartitioner, Diagnostic, Diagnostics, Graph, GraphBuilder, Partition,
    Severity,
};

#[cfg(feature = "csv")]
pub use sheetc_csv::{CsvError, CsvReadOptions, CsvReader};

#[cfg(feature = "csv")]
use std::path::Path;

/// Extension trait for loading workbooks from CSV files
#[cfg(feature = "csv")]
pub trait WorkbookExt: Sized {
    /// Open a CSV file as a one-sheet workbook named after the file
    fn open<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> GenerateResult<Self>;

    /// Add another CSV file as sheet `name`, for cross-sheet references
    fn attach_csv<P: AsRef<Path>>(
        &mut self,
        name: &str,
        path: P,
        options: &CsvReadOptions,
    ) -> GenerateResult<usize>;
}

#[cfg(feature = "csv")]
impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> GenerateResult<Self> {
        let worksheet = CsvReader::read_file(path, options)?;
        let mut workbook = Workbook::empty();
        workbook.add_existing_worksheet(worksheet)?;
        Ok(workbook)
    }

    fn attach_csv<P: AsRef<Path>>(
        &mut self,
        name: &str,
        path: P,
        options: &CsvReadOptions,
    ) -> GenerateResult<usize> {
        let options = options.clone().with_sheet_name(name);
        let worksheet = CsvReader::read_file(path, &options)?;
        Ok(self.add_existing_worksheet(worksheet)?)
    }
}
