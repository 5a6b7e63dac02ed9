//! Cell address and range types
//!
//! Two numbering schemes meet here. [`CellAddress`] stores 0-based indices, the way
//! the graph and the parser address cells internally. The free functions
//! [`column_to_number`], [`number_to_column`] and [`addresses_in_range`] speak the
//! 1-based spreadsheet dialect (`A` = 1) used by cell sources and diagnostics.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// Convert column letters to a 1-based column number (`A` = 1, `Z` = 26, `AA` = 27)
///
/// Letters are case-insensitive. Columns beyond `XFD` are rejected.
pub fn column_to_number(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidAddress("empty column letters".into()));
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidAddress(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        if col > MAX_COLS as u32 {
            return Err(Error::ColumnOutOfBounds(letters.to_uppercase(), MAX_COLS));
        }
    }

    Ok(col)
}

/// Convert a 1-based column number to letters (1 = `A`, 27 = `AA`)
///
/// Zero has no column name and yields an empty string.
pub fn number_to_column(number: u32) -> String {
    let mut result = String::new();
    let mut n = number;

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Enumerate every address inside the rectangle spanned by two corners
///
/// Corners may be given in any order. The enumeration is column-major: the outer
/// loop walks columns, the inner loop walks rows, so `A1:B2` yields
/// `A1, A2, B1, B2`.
pub fn addresses_in_range(start: CellAddress, end: CellAddress) -> Vec<CellAddress> {
    CellRange::new(start, end).cells().collect()
}

/// A cell address (e.g., "A1", "$B$2")
///
/// Equality and hashing ignore the `$` markers: `$A$1` and `A1` name the same cell.
#[derive(Debug, Clone, Copy)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u16,
    /// Whether the row reference is absolute ($)
    pub row_absolute: bool,
    /// Whether the column reference is absolute ($)
    pub col_absolute: bool,
}

impl PartialEq for CellAddress {
    fn eq(&self, other: &Self) -> bool {
        self.row == other.row && self.col == other.col
    }
}

impl Eq for CellAddress {}

impl std::hash::Hash for CellAddress {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.row.hash(state);
        self.col.hash(state);
    }
}

impl PartialOrd for CellAddress {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellAddress {
    /// Column-major ordering, matching [`addresses_in_range`]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.col, self.row).cmp(&(other.col, other.row))
    }
}

impl CellAddress {
    /// Create a new cell address with relative references
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Create a cell address from 1-based row and column numbers
    pub fn from_numbers(row: u32, col: u32) -> Result<Self> {
        if row == 0 || row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }
        if col == 0 || col > MAX_COLS as u32 {
            return Err(Error::ColumnOutOfBounds(number_to_column(col), MAX_COLS));
        }
        Ok(Self::new(row - 1, (col - 1) as u16))
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use sheetc_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("A1").unwrap();
    /// assert_eq!(addr.row, 0);
    /// assert_eq!(addr.col, 0);
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert_eq!(addr.row, 1);
    /// assert!(addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        let col_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }

        if pos == col_start {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = column_to_number(&s[col_start..pos])?;

        let row_absolute = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let row_str = &s[pos..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }

        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;

        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        if row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }

        Ok(Self {
            row: row - 1,
            col: (col - 1) as u16,
            row_absolute,
            col_absolute,
        })
    }

    /// 1-based row number as shown in a spreadsheet
    pub fn row_number(&self) -> u32 {
        self.row + 1
    }

    /// 1-based column number
    pub fn column_number(&self) -> u32 {
        self.col as u32 + 1
    }

    /// Column letters of this address
    pub fn column_letters(&self) -> String {
        number_to_column(self.column_number())
    }

    /// Format as A1-style string, keeping `$` markers
    pub fn to_a1_string(&self) -> String {
        let mut result = String::new();

        if self.col_absolute {
            result.push('$');
        }
        result.push_str(&self.column_letters());

        if self.row_absolute {
            result.push('$');
        }
        result.push_str(&self.row_number().to_string());

        result
    }

    /// Format as A1-style string without `$` markers
    pub fn to_relative_string(&self) -> String {
        format!("{}{}", self.column_letters(), self.row_number())
    }

    /// Create a range from this address to another
    pub fn to(&self, other: CellAddress) -> CellRange {
        CellRange::new(*self, other)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A range of cells (e.g., "A1:B10")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range, normalizing corners to top-left / bottom-right
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        let (start_row, end_row) = if start.row <= end.row {
            (start.row, end.row)
        } else {
            (end.row, start.row)
        };

        let (start_col, end_col) = if start.col <= end.col {
            (start.col, end.col)
        } else {
            (end.col, start.col)
        };

        Self {
            start: CellAddress::new(start_row, start_col),
            end: CellAddress::new(end_row, end_col),
        }
    }

    /// Create a range from 0-based row/column indices
    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self::new(addr, addr)
    }

    /// Parse a range from A1:B10 notation
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(colon_pos) = s.find(':') {
            let start = CellAddress::parse(&s[..colon_pos])?;
            let end = CellAddress::parse(&s[colon_pos + 1..])?;
            Ok(Self::new(start, end))
        } else {
            let addr = CellAddress::parse(s)?;
            Ok(Self::single(addr))
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Whether the range covers exactly one cell
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Iterate over all cell addresses in the range, column by column
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
            remaining: self.cell_count() as usize,
        }
    }

    /// Rows of the range, each row listed left to right
    ///
    /// This is the matrix shape lookup functions consume.
    pub fn rows(&self) -> Vec<Vec<CellAddress>> {
        (self.start.row..=self.end.row)
            .map(|row| {
                (self.start.col..=self.end.col)
                    .map(|col| CellAddress::new(row, col))
                    .collect()
            })
            .collect()
    }

    /// Format as A1:B10 string
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Column-major iterator over cells in a range
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u32,
    current_col: u16,
    remaining: usize,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let addr = CellAddress::new(self.current_row, self.current_col);
        self.remaining -= 1;

        self.current_row += 1;
        if self.current_row > self.range.end.row {
            self.current_row = self.range.start.row;
            self.current_col = self.current_col.saturating_add(1);
        }

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for CellRangeIterator {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn a(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_number_to_column() {
        assert_eq!(number_to_column(1), "A");
        assert_eq!(number_to_column(2), "B");
        assert_eq!(number_to_column(26), "Z");
        assert_eq!(number_to_column(27), "AA");
        assert_eq!(number_to_column(702), "ZZ");
        assert_eq!(number_to_column(703), "AAA");
        assert_eq!(number_to_column(16384), "XFD");
        assert_eq!(number_to_column(0), "");
    }

    #[test]
    fn test_column_to_number() {
        assert_eq!(column_to_number("A").unwrap(), 1);
        assert_eq!(column_to_number("Z").unwrap(), 26);
        assert_eq!(column_to_number("AA").unwrap(), 27);
        assert_eq!(column_to_number("ZZ").unwrap(), 702);
        assert_eq!(column_to_number("XFD").unwrap(), 16384);
        assert_eq!(column_to_number("aa").unwrap(), 27);

        assert!(column_to_number("").is_err());
        assert!(column_to_number("A1").is_err());
        assert!(column_to_number("XFE").is_err());
    }

    #[test]
    fn test_cell_address_parse() {
        let addr = a("B2");
        assert_eq!(addr.row, 1);
        assert_eq!(addr.col, 1);
        assert_eq!(addr.row_number(), 2);
        assert_eq!(addr.column_number(), 2);

        let addr = a("$A1");
        assert!(addr.col_absolute);
        assert!(!addr.row_absolute);

        let addr = a("XFD1048576");
        assert_eq!(addr.row, 1048575);
        assert_eq!(addr.col, 16383);
    }

    #[test]
    fn test_cell_address_parse_errors() {
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("A").is_err());
        assert!(CellAddress::parse("1").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("A1048577").is_err());
        assert!(CellAddress::parse("XFE1").is_err());
    }

    #[test]
    fn test_absolute_markers_do_not_affect_identity() {
        assert_eq!(a("$A$1"), a("A1"));
        assert_eq!(a("$A$1").to_string(), "$A$1");
        assert_eq!(a("$A$1").to_relative_string(), "A1");
    }

    #[test]
    fn test_addresses_in_range_single() {
        assert_eq!(addresses_in_range(a("A1"), a("A1")), vec![a("A1")]);
    }

    #[test]
    fn test_addresses_in_range_column_major() {
        assert_eq!(
            addresses_in_range(a("A1"), a("B2")),
            vec![a("A1"), a("A2"), a("B1"), a("B2")]
        );
        // Corners in reverse order describe the same rectangle
        assert_eq!(
            addresses_in_range(a("B2"), a("A1")),
            vec![a("A1"), a("A2"), a("B1"), a("B2")]
        );
    }

    #[test]
    fn test_range_rows_shape() {
        let range = CellRange::parse("A1:B3").unwrap();
        let rows = range.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![a("A1"), a("B1")]);
        assert_eq!(rows[2], vec![a("A3"), a("B3")]);
    }

    #[test]
    fn test_cell_range_contains() {
        let range = CellRange::parse("B2:D4").unwrap();
        assert!(range.contains(&a("B2")));
        assert!(range.contains(&a("D4")));
        assert!(!range.contains(&a("A1")));
        assert!(!range.contains(&a("B5")));
    }

    proptest! {
        #[test]
        fn prop_column_round_trip(n in 1u32..=16384) {
            let letters = number_to_column(n);
            prop_assert_eq!(column_to_number(&letters).unwrap(), n);
            prop_assert_eq!(number_to_column(column_to_number(&letters).unwrap()), letters);
        }

        #[test]
        fn prop_range_enumeration_size(r1 in 0u32..40, c1 in 0u16..40, r2 in 0u32..40, c2 in 0u16..40) {
            let cells = addresses_in_range(CellAddress::new(r1, c1), CellAddress::new(r2, c2));
            let expected = (r1.abs_diff(r2) + 1) as usize * (c1.abs_diff(c2) + 1) as usize;
            prop_assert_eq!(cells.len(), expected);
            let mut sorted = cells.clone();
            sorted.sort();
            prop_assert_eq!(sorted, cells);
        }
    }
}
