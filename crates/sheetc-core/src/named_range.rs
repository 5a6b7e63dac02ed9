//! Named range definitions
//!
//! Named ranges let formulas say `=Price * TaxRate` instead of `=B4 * $B$1`. Graph
//! construction consults this table whenever the parser produces a name reference
//! instead of a raw address.
//!
//! ```text
//! TaxRate -> Sheet1!$B$1        (single cell)
//! Sales   -> Sheet1!$A$1:$A$10  (range)
//! ```

use std::collections::HashMap;

use crate::cell::{CellAddress, CellRange};
use crate::error::{Error, Result};

/// Scope of a named range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameScope {
    /// Available throughout the workbook (global)
    Workbook,
    /// Scoped to a specific sheet (local)
    Sheet(usize),
}

/// What a name points at once its `refers_to` text is parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTarget {
    /// Sheet qualifier, if the definition carried one
    pub sheet: Option<String>,
    /// Target cells; a single cell is a one-cell range
    pub range: CellRange,
}

impl NameTarget {
    /// Whether the name points at exactly one cell
    pub fn is_single_cell(&self) -> bool {
        self.range.is_single()
    }

    /// The single target cell, if there is exactly one
    pub fn single_cell(&self) -> Option<CellAddress> {
        self.is_single_cell().then_some(self.range.start)
    }
}

/// A named range definition
#[derive(Debug, Clone)]
pub struct NamedRange {
    /// The name (e.g., "SalesData", "TaxRate"); case-insensitive
    pub name: String,
    /// Scope of this name (workbook-wide or sheet-specific)
    pub scope: NameScope,
    /// Reference text, e.g. `Sheet1!$A$1` or `$A$1:$D$10`
    pub refers_to: String,
    /// Optional comment/description for documentation
    pub comment: Option<String>,
}

impl NamedRange {
    /// Create a new named range
    pub fn new(name: impl Into<String>, refers_to: impl Into<String>, scope: NameScope) -> Self {
        Self {
            name: name.into(),
            scope,
            refers_to: refers_to.into(),
            comment: None,
        }
    }

    /// Create a workbook-scoped named range
    pub fn workbook_scope(name: impl Into<String>, refers_to: impl Into<String>) -> Self {
        Self::new(name, refers_to, NameScope::Workbook)
    }

    /// Create a sheet-scoped named range
    pub fn sheet_scope(
        name: impl Into<String>,
        refers_to: impl Into<String>,
        sheet_index: usize,
    ) -> Self {
        Self::new(name, refers_to, NameScope::Sheet(sheet_index))
    }

    /// Set a comment for this named range
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Parse `refers_to` into a cell or range target
    ///
    /// Constants and formulas (`=SUM(...)`) are not references and yield an error.
    pub fn target(&self) -> Result<NameTarget> {
        let text = self.refers_to.trim();
        let text = text.strip_prefix('=').unwrap_or(text);

        let (sheet, reference) = match text.rfind('!') {
            Some(pos) => {
                let sheet = text[..pos].trim_matches('\'').to_string();
                (Some(sheet), &text[pos + 1..])
            }
            None => (None, text),
        };

        let range = CellRange::parse(reference).map_err(|_| {
            Error::InvalidName(format!(
                "'{}' does not refer to a cell or range: {}",
                self.name, self.refers_to
            ))
        })?;

        Ok(NameTarget { sheet, range })
    }
}

/// Collection of named ranges with case-insensitive lookup
#[derive(Debug, Default, Clone)]
pub struct NamedRangeCollection {
    /// Keyed by lowercase name, suffixed with `:sheet:{index}` for sheet scope
    ranges: HashMap<String, NamedRange>,
}

impl NamedRangeCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    fn make_key(name: &str, scope: &NameScope) -> String {
        let name_lower = name.to_lowercase();
        match scope {
            NameScope::Workbook => name_lower,
            NameScope::Sheet(idx) => format!("{}:sheet:{}", name_lower, idx),
        }
    }

    /// Define a new named range
    ///
    /// Returns an error if a name with the same scope already exists
    pub fn define(&mut self, range: NamedRange) -> Result<()> {
        let key = Self::make_key(&range.name, &range.scope);

        if self.ranges.contains_key(&key) {
            return Err(Error::InvalidName(format!(
                "Named range '{}' already exists in this scope",
                range.name
            )));
        }

        self.ranges.insert(key, range);
        Ok(())
    }

    /// Get a named range by name and current sheet context
    ///
    /// A sheet-scoped name shadows a workbook-scoped one.
    pub fn get(&self, name: &str, current_sheet: usize) -> Option<&NamedRange> {
        let sheet_key = Self::make_key(name, &NameScope::Sheet(current_sheet));
        if let Some(range) = self.ranges.get(&sheet_key) {
            return Some(range);
        }

        let workbook_key = Self::make_key(name, &NameScope::Workbook);
        self.ranges.get(&workbook_key)
    }

    /// Resolve a name straight to its target
    pub fn resolve(&self, name: &str, current_sheet: usize) -> Option<Result<NameTarget>> {
        self.get(name, current_sheet).map(NamedRange::target)
    }

    /// Iterate over all named ranges
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges.values()
    }

    /// Get the number of named ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
