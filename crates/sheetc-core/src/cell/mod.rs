//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] and [`CellType`] - The value stored in a cell and its primitive type
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`CellSource`] and [`CellHandle`] - Read-only access to a grid of cells

mod address;
mod source;
mod value;

pub use address::{
    addresses_in_range, column_to_number, number_to_column, CellAddress, CellRange,
    CellRangeIterator,
};
pub use source::{CellHandle, CellSource};
pub use value::{CellError, CellType, CellValue, SharedString};
