//! Graph vertices
//!
//! Vertices live in an arena owned by [`Graph`](crate::Graph) and refer to each other
//! by [`VertexId`]. An edge runs from the referencing formula (parent) to the
//! referenced cell (child).

use std::collections::BTreeSet;
use std::fmt;

use sheetc_core::{CellAddress, CellRange, CellType, CellValue};
use sheetc_formula::FormulaExpr;

use crate::partition::ClassId;

/// Index of a vertex in its graph's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub(crate) u32);

impl VertexId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Cell or range location of a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Cell(CellAddress),
    Range(CellRange),
}

/// Identity of a vertex
///
/// The sheet is folded to lowercase because sheet names compare case-insensitively;
/// `None` means the sheet being compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexKey {
    pub sheet: Option<String>,
    pub location: Location,
}

impl VertexKey {
    /// Cell on the sheet being compiled
    pub fn cell(address: CellAddress) -> Self {
        Self {
            sheet: None,
            location: Location::Cell(address),
        }
    }

    /// Cell on another sheet
    pub fn external(sheet: &str, address: CellAddress) -> Self {
        Self {
            sheet: Some(sheet.to_lowercase()),
            location: Location::Cell(address),
        }
    }

    /// Range, optionally on another sheet
    pub fn range(sheet: Option<&str>, range: CellRange) -> Self {
        Self {
            sheet: sheet.map(str::to_lowercase),
            location: Location::Range(range),
        }
    }
}

/// What a vertex stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    Cell,
    Range,
}

/// Role of a vertex, derived from its edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Referenced, references nothing
    Constant,
    /// Referenced, references other vertices
    Formula,
    /// Not referenced; the root of a generated unit
    OutputField,
}

/// A graph node representing one cell or one rectangular range
#[derive(Debug, Clone)]
pub struct Vertex {
    pub(crate) id: VertexId,
    pub(crate) key: VertexKey,
    pub(crate) sheet: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) value: CellValue,
    pub(crate) cell_type: CellType,
    pub(crate) formula: Option<String>,
    pub(crate) ast: Option<FormulaExpr>,
    pub(crate) parents: BTreeSet<VertexId>,
    pub(crate) children: BTreeSet<VertexId>,
    pub(crate) class: Option<ClassId>,
    pub(crate) variable_name: Option<String>,
}

impl Vertex {
    pub(crate) fn new(key: VertexKey, sheet: Option<String>, value: CellValue) -> Self {
        let cell_type = value.cell_type();
        let formula = value.formula_text().map(str::to_string);
        Self {
            id: VertexId(0),
            key,
            sheet,
            name: None,
            value,
            cell_type,
            formula,
            ast: None,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
            class: None,
            variable_name: None,
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn key(&self) -> &VertexKey {
        &self.key
    }

    pub fn kind(&self) -> VertexKind {
        match self.key.location {
            Location::Cell(_) => VertexKind::Cell,
            Location::Range(_) => VertexKind::Range,
        }
    }

    /// Cell address, for cell vertices
    pub fn address(&self) -> Option<CellAddress> {
        match self.key.location {
            Location::Cell(address) => Some(address),
            Location::Range(_) => None,
        }
    }

    /// Covered range, for range vertices
    pub fn range(&self) -> Option<CellRange> {
        match self.key.location {
            Location::Range(range) => Some(range),
            Location::Cell(_) => None,
        }
    }

    /// Origin sheet as written in the referencing formula
    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    /// Defined name this range vertex was created for
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// A cell that lives on another sheet
    pub fn is_external(&self) -> bool {
        self.key.sheet.is_some() && self.kind() == VertexKind::Cell
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    /// Type detected from the cell's literal or cached value
    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Raw formula text
    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    /// Parsed formula; absent for literals, externals and unparseable formulas
    pub fn ast(&self) -> Option<&FormulaExpr> {
        self.ast.as_ref()
    }

    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    pub fn parents(&self) -> &BTreeSet<VertexId> {
        &self.parents
    }

    pub fn children(&self) -> &BTreeSet<VertexId> {
        &self.children
    }

    pub fn class(&self) -> Option<ClassId> {
        self.class
    }

    pub fn variable_name(&self) -> Option<&str> {
        self.variable_name.as_deref()
    }

    /// Derived role; `None` for isolated literals
    ///
    /// A formula that references nothing and is referenced by nothing still counts
    /// as an output field so it gets a unit of its own.
    pub fn node_type(&self) -> Option<NodeType> {
        match (self.parents.is_empty(), self.children.is_empty()) {
            (false, true) => Some(NodeType::Constant),
            (false, false) => Some(NodeType::Formula),
            (true, false) => Some(NodeType::OutputField),
            (true, true) if self.is_formula() && !self.is_external() => {
                Some(NodeType::OutputField)
            }
            (true, true) => None,
        }
    }

    /// Display label such as `B1`, `Sheet2!A3` or `A1:B3`
    pub fn label(&self) -> String {
        let location = match self.key.location {
            Location::Cell(address) => address.to_relative_string(),
            Location::Range(range) => format!(
                "{}:{}",
                range.start.to_relative_string(),
                range.end.to_relative_string()
            ),
        };
        match &self.sheet {
            Some(sheet) if sheet.contains(' ') => format!("'{}'!{}", sheet, location),
            Some(sheet) => format!("{}!{}", sheet, location),
            None => location,
        }
    }

    pub(crate) fn assign_class(&mut self, class: ClassId) {
        debug_assert!(self.class.is_none(), "class assigned twice for {}", self.id);
        self.class.get_or_insert(class);
    }

    pub(crate) fn assign_variable_name(&mut self, name: String) {
        debug_assert!(self.variable_name.is_none());
        self.variable_name.get_or_insert(name);
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Vertex {}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_equality_is_by_key() {
        let a = Vertex::new(VertexKey::cell(addr("A1")), None, CellValue::Number(1.0));
        let b = Vertex::new(VertexKey::cell(addr("$A$1")), None, CellValue::Number(2.0));
        let c = Vertex::new(
            VertexKey::external("Sheet2", addr("A1")),
            Some("Sheet2".into()),
            CellValue::Number(1.0),
        );
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            VertexKey::external("SHEET2", addr("A1")),
            VertexKey::external("sheet2", addr("A1"))
        );
    }

    #[test]
    fn test_node_type() {
        let mut v = Vertex::new(VertexKey::cell(addr("A1")), None, CellValue::Number(1.0));
        assert_eq!(v.node_type(), None);

        v.parents.insert(VertexId(1));
        assert_eq!(v.node_type(), Some(NodeType::Constant));

        v.children.insert(VertexId(2));
        assert_eq!(v.node_type(), Some(NodeType::Formula));

        v.parents.clear();
        assert_eq!(v.node_type(), Some(NodeType::OutputField));

        let lonely = Vertex::new(
            VertexKey::cell(addr("C1")),
            None,
            CellValue::formula("=TODAY()"),
        );
        assert_eq!(lonely.node_type(), Some(NodeType::OutputField));
    }

    #[test]
    fn test_labels() {
        let external = Vertex::new(
            VertexKey::external("Q1 Data", addr("B2")),
            Some("Q1 Data".into()),
            CellValue::Empty,
        );
        assert_eq!(external.label(), "'Q1 Data'!B2");
        assert!(external.is_external());

        let range = Vertex::new(
            VertexKey::range(None, CellRange::parse("A1:B3").unwrap()),
            None,
            CellValue::Empty,
        );
        assert_eq!(range.label(), "A1:B3");
        assert_eq!(range.kind(), VertexKind::Range);
        assert!(!range.is_external());
    }
}
