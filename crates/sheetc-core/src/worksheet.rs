//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellHandle, CellRange, CellSource, CellValue};
use crate::error::Result;

/// A worksheet (single sheet in a workbook)
///
/// Cells are stored sparsely, ordered column-major, so iteration order is stable
/// and matches range enumeration.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<CellAddress, CellValue>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Get a cell value by A1 address
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get a cell value by 0-based row/column
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(&CellAddress::new(row, col))
            .cloned()
            .unwrap_or_default()
    }

    /// Set a cell value by A1 address
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value);
        Ok(())
    }

    /// Set a cell value by 0-based row/column; setting `Empty` clears the cell
    pub fn set_cell_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) {
        let value = value.into();
        let addr = CellAddress::new(row, col);
        if value.is_empty() {
            self.cells.remove(&addr);
        } else {
            self.cells.insert(addr, value);
        }
    }

    /// Set a formula by A1 address; a leading `=` is added when missing
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let text = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={}", formula)
        };
        self.set_cell_value(address, CellValue::formula(text))
    }

    /// Iterate over formula cells as (address, formula text)
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &str)> {
        self.cells
            .iter()
            .filter_map(|(addr, value)| value.formula_text().map(|text| (*addr, text)))
    }

    /// Number of populated cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check whether the sheet has no populated cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Smallest range covering every populated cell
    pub fn used_range(&self) -> Option<CellRange> {
        let mut iter = self.cells.keys();
        let first = iter.next()?;
        let (mut min_row, mut max_row) = (first.row, first.row);
        let (mut min_col, mut max_col) = (first.col, first.col);
        for addr in iter {
            min_row = min_row.min(addr.row);
            max_row = max_row.max(addr.row);
            min_col = min_col.min(addr.col);
            max_col = max_col.max(addr.col);
        }
        Some(CellRange::from_indices(min_row, min_col, max_row, max_col))
    }
}

impl CellSource for Worksheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn cells(&self) -> Vec<CellHandle> {
        self.cells
            .iter()
            .map(|(addr, value)| CellHandle::new(*addr, value.clone()))
            .collect()
    }

    fn cell(&self, address: &CellAddress) -> Option<CellHandle> {
        self.cells
            .get(address)
            .map(|value| CellHandle::new(*address, value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 5.0).unwrap();
        sheet.set_cell_formula("B1", "A1*2").unwrap();

        assert_eq!(sheet.get_value("A1").unwrap(), CellValue::Number(5.0));
        assert_eq!(
            sheet.get_value("B1").unwrap().formula_text(),
            Some("=A1*2")
        );
        assert_eq!(sheet.formula_cells().count(), 1);
    }

    #[test]
    fn test_empty_value_clears_cell() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_value("A1", CellValue::Empty).unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_cell_source_order_is_column_major() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("B1", 1.0).unwrap();
        sheet.set_cell_value("A2", 2.0).unwrap();
        sheet.set_cell_value("A1", 3.0).unwrap();

        let order: Vec<String> = sheet
            .cells()
            .iter()
            .map(|c| c.address.to_string())
            .collect();
        assert_eq!(order, vec!["A1", "A2", "B1"]);
        assert_eq!(sheet.used_range().unwrap().to_string(), "A1:B2");
    }
}
