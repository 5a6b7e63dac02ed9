//! Prelude module - common imports for sheetc users
//!
//! ```rust
//! use sheetc::prelude::*;
//! ```

pub use crate::{
    // Cell types
    CellAddress,
    CellError,
    CellRange,
    CellValue,
    // Code generation
    CodegenOptions,
    // Diagnostics
    Diagnostics,
    // Error types
    GenerateError,
    GenerateOptions,
    Generation,
    Severity,
    // Main types
    Workbook,
    // Extension traits
    WorkbookGenerateExt,
    Worksheet,
};

#[cfg(feature = "csv")]
pub use crate::{CsvReadOptions, CsvReader, WorkbookExt};
