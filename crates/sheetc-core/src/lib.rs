//! # sheetc-core
//!
//! Core data structures for sheetc.
//!
//! This crate provides the spreadsheet-side vocabulary the rest of the workspace
//! builds on:
//! - [`CellAddress`] and [`CellRange`] - Cell addressing, column letter conversion
//!   and range enumeration
//! - [`CellValue`] and [`CellType`] - Cell values and their primitive types
//! - [`CellSource`] - Read-only access to a grid of cells
//! - [`Workbook`], [`Worksheet`] and [`NamedRangeCollection`] - In-memory documents
//!
//! ## Example
//!
//! ```rust
//! use sheetc_core::{Workbook, CellValue};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A1", 5.0).unwrap();
//! sheet.set_cell_formula("B1", "=A1*2").unwrap();
//!
//! assert_eq!(sheet.get_value("A1").unwrap(), CellValue::Number(5.0));
//! ```

pub mod cell;
pub mod error;
pub mod named_range;
pub mod workbook;
pub mod worksheet;

pub use cell::{
    addresses_in_range, column_to_number, number_to_column, CellAddress, CellError, CellHandle,
    CellRange, CellSource, CellType, CellValue, SharedString,
};
pub use error::{Error, Result};
pub use named_range::{NameScope, NameTarget, NamedRange, NamedRangeCollection};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
