//! Read-only cell source contract

use super::{CellAddress, CellType, CellValue};

/// A single cell as handed out by a [`CellSource`]
#[derive(Debug, Clone, PartialEq)]
pub struct CellHandle {
    /// Where the cell lives
    pub address: CellAddress,
    /// Raw value, including formula text and any cached result
    pub value: CellValue,
}

impl CellHandle {
    pub fn new(address: CellAddress, value: CellValue) -> Self {
        Self { address, value }
    }

    /// Detected primitive type
    pub fn cell_type(&self) -> CellType {
        self.value.cell_type()
    }

    /// Formula text, if the cell carries one
    pub fn formula(&self) -> Option<&str> {
        self.value.formula_text()
    }

    /// 1-based row number
    pub fn row(&self) -> u32 {
        self.address.row_number()
    }

    /// 1-based column number
    pub fn column(&self) -> u32 {
        self.address.column_number()
    }
}

/// A rectangular grid of cells, addressed by A1 coordinates
///
/// Graph construction depends only on this contract, so any storage that can
/// enumerate its populated cells and look one up by address can feed it.
pub trait CellSource {
    /// Name of the sheet the cells belong to
    fn name(&self) -> &str;

    /// Every populated cell, in a stable order
    fn cells(&self) -> Vec<CellHandle>;

    /// Look up a single cell
    fn cell(&self, address: &CellAddress) -> Option<CellHandle>;
}
