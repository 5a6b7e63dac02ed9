//! Graph construction
//!
//! [`GraphBuilder`] turns a [`CellSource`] into a [`Graph`]: one vertex per
//! populated cell, then one edge per reference found in each formula. Reference
//! collection walks the formula tree with an explicit stack, so arbitrarily deep
//! formulas cannot exhaust the call stack.
//!
//! Problems with one formula never stop the build. They are recorded in the
//! [`Diagnostics`] log with the cell's address and formula text.

use ahash::AHashMap;
use sheetc_core::{CellAddress, CellHandle, CellSource, CellValue, NamedRangeCollection};
use sheetc_formula::{normalize_locale, parse_formula, FormulaExpr, FunctionRegistry};

use crate::diagnostics::Diagnostics;
use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;
use crate::vertex::{Vertex, VertexId, VertexKey};

/// Builds a dependency graph from a cell source
///
/// # Example
///
/// ```rust
/// use sheetc_core::Worksheet;
/// use sheetc_graph::{Diagnostics, GraphBuilder};
///
/// let mut sheet = Worksheet::new("Sheet1");
/// sheet.set_cell_value("A1", 5.0).unwrap();
/// sheet.set_cell_formula("B1", "=A1*2").unwrap();
///
/// let mut diagnostics = Diagnostics::new();
/// let graph = GraphBuilder::new()
///     .build(&sheet, |_, _| None, &mut diagnostics)
///     .unwrap();
/// assert_eq!(graph.len(), 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    names: Option<(&'a NamedRangeCollection, usize)>,
    normalize_locale: bool,
    functions: &'a FunctionRegistry,
}

impl<'a> GraphBuilder<'a> {
    pub fn new() -> Self {
        Self {
            names: None,
            normalize_locale: false,
            functions: FunctionRegistry::builtins(),
        }
    }

    /// Resolve defined names against `names`, as seen from sheet `sheet_index`
    pub fn with_names(mut self, names: &'a NamedRangeCollection, sheet_index: usize) -> Self {
        self.names = Some((names, sheet_index));
        self
    }

    /// Rewrite comma-decimal formulas before parsing
    pub fn normalize_locale(mut self, enabled: bool) -> Self {
        self.normalize_locale = enabled;
        self
    }

    /// Use a custom function registry
    pub fn with_functions(mut self, functions: &'a FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    /// Build the graph
    ///
    /// `resolve_external` is called at most once per distinct `(sheet, address)` for
    /// references to other sheets; `None` drops the edge with a warning.
    ///
    /// Fails only when the source has no cells.
    pub fn build<S, R>(
        &self,
        source: &S,
        resolve_external: R,
        diagnostics: &mut Diagnostics,
    ) -> GraphResult<Graph>
    where
        S: CellSource + ?Sized,
        R: FnMut(&str, CellAddress) -> Option<CellHandle>,
    {
        let cells = source.cells();
        if cells.iter().all(|handle| handle.value.is_empty()) {
            return Err(GraphError::EmptyInput(source.name().to_string()));
        }

        let mut graph = Graph::new(source.name());
        let mut formulas = Vec::new();
        for handle in cells {
            if handle.value.is_empty() {
                continue;
            }
            let vertex = self.make_vertex(handle, diagnostics);
            let has_ast = vertex.ast().is_some();
            let id = graph.add_vertex(vertex);
            if has_ast {
                formulas.push(id);
            }
        }
        tracing::debug!(
            "Created {} vertices for '{}', {} with formulas",
            graph.len(),
            source.name(),
            formulas.len()
        );

        let mut linker = Linker {
            graph: &mut graph,
            names: self.names,
            functions: self.functions,
            resolve_external,
            cache: AHashMap::new(),
            diagnostics,
        };
        for id in formulas {
            linker.link(id);
        }

        graph.recompute_layout();
        diagnostics.success(format!(
            "Built dependency graph for '{}': {} cells, {} external",
            graph.sheet_name(),
            graph.active_ids().len(),
            graph.external_ids().len()
        ));
        Ok(graph)
    }

    fn make_vertex(&self, handle: CellHandle, diagnostics: &mut Diagnostics) -> Vertex {
        let address = handle.address;
        let mut vertex = Vertex::new(VertexKey::cell(address), None, handle.value);

        if let Some(text) = vertex.formula.clone() {
            let text = if self.normalize_locale {
                normalize_locale(&text)
            } else {
                text
            };
            match parse_formula(&text) {
                Ok(ast) => vertex.ast = Some(ast),
                Err(e) => diagnostics.error_at(
                    address.to_relative_string(),
                    vertex.formula(),
                    format!("Could not parse formula: {e}"),
                ),
            }
        }

        vertex
    }
}

impl Default for GraphBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-build state for wiring edges
struct Linker<'g, 'a, R> {
    graph: &'g mut Graph,
    names: Option<(&'a NamedRangeCollection, usize)>,
    functions: &'a FunctionRegistry,
    resolve_external: R,
    /// Resolver results keyed by (lowercase sheet, address); misses are cached too
    cache: AHashMap<(String, CellAddress), Option<VertexId>>,
    diagnostics: &'g mut Diagnostics,
}

impl<R> Linker<'_, '_, R>
where
    R: FnMut(&str, CellAddress) -> Option<CellHandle>,
{
    /// Wire every reference in one formula
    fn link(&mut self, id: VertexId) {
        let Some(ast) = self.graph.vertex_mut(id).ast.take() else {
            return;
        };

        let mut stack: Vec<(&FormulaExpr, Option<&str>)> = vec![(&ast, None)];
        while let Some((node, sheet)) = stack.pop() {
            let result = match node {
                FormulaExpr::Sheet { sheet, reference } => {
                    stack.push((reference, Some(sheet.as_str())));
                    Ok(())
                }
                FormulaExpr::CellRef(address) => {
                    self.link_cell(id, sheet, *address, false).map(|_| ())
                }
                FormulaExpr::RangeRef(range) => range
                    .cells()
                    .try_for_each(|address| self.link_cell(id, sheet, address, true).map(|_| ())),
                FormulaExpr::NameRef(name) => self.link_name(id, name),
                FormulaExpr::Function { name, .. } if !self.functions.contains(name) => {
                    self.warn(id, format!("Unknown function {name}; arguments not linked"));
                    Ok(())
                }
                other => {
                    for child in other.children().into_iter().rev() {
                        stack.push((child, sheet));
                    }
                    Ok(())
                }
            };

            if let Err(e) = result {
                let vertex = self.graph.vertex(id);
                self.diagnostics
                    .error_at(vertex.label(), vertex.formula(), e.to_string());
            }
        }

        self.graph.vertex_mut(id).ast = Some(ast);
    }

    /// Wire `parent -> address`, returning the child when one was linked
    ///
    /// Blank cells inside a range are skipped; a direct reference to a missing
    /// cell is an error.
    fn link_cell(
        &mut self,
        parent: VertexId,
        sheet: Option<&str>,
        address: CellAddress,
        in_range: bool,
    ) -> GraphResult<Option<VertexId>> {
        match sheet.filter(|s| !self.graph.is_local_sheet(s)) {
            Some(sheet) => Ok(self.link_external(parent, sheet, address)),
            None => match self.graph.find_cell(address) {
                Some(child) => {
                    self.graph.add_edge(parent, child);
                    Ok(Some(child))
                }
                None if in_range => {
                    tracing::trace!("Skipping blank cell {address} in range");
                    Ok(None)
                }
                None => Err(GraphError::UnresolvedReference(address.to_relative_string())),
            },
        }
    }

    fn link_external(
        &mut self,
        parent: VertexId,
        sheet: &str,
        address: CellAddress,
    ) -> Option<VertexId> {
        let cache_key = (sheet.to_lowercase(), address);
        let child = match self.cache.get(&cache_key) {
            Some(cached) => *cached,
            None => {
                let resolved = (self.resolve_external)(sheet, address).map(|handle| {
                    // Externals are inputs: keep the cached result, not the formula
                    let formula = handle.formula().map(str::to_string);
                    let mut vertex = Vertex::new(
                        VertexKey::external(sheet, address),
                        Some(sheet.to_string()),
                        handle.value.effective_value().clone(),
                    );
                    vertex.formula = formula;
                    self.graph.add_vertex(vertex)
                });
                if resolved.is_none() {
                    self.warn(
                        parent,
                        format!("Could not resolve {sheet}!{address}; reference dropped"),
                    );
                }
                self.cache.insert(cache_key, resolved);
                resolved
            }
        };

        if let Some(child) = child {
            self.graph.add_edge(parent, child);
        }
        child
    }

    /// Wire a defined name: a single cell links directly, a multi-cell target
    /// links through one range vertex whose children are the member cells
    fn link_name(&mut self, parent: VertexId, name: &str) -> GraphResult<()> {
        let (names, sheet_index) = self
            .names
            .ok_or_else(|| GraphError::UnknownName(name.to_string()))?;
        let target = names
            .resolve(name, sheet_index)
            .ok_or_else(|| GraphError::UnknownName(name.to_string()))??;

        let sheet = target
            .sheet
            .as_deref()
            .filter(|s| !self.graph.is_local_sheet(s));

        if let Some(address) = target.single_cell() {
            if let Some(child) = self.link_cell(parent, sheet, address, false)? {
                self.graph.bind_name(name, child);
            }
            return Ok(());
        }

        let key = VertexKey::range(sheet, target.range);
        let range_id = match self.graph.find(&key) {
            Some(id) => id,
            None => {
                let mut vertex = Vertex::new(key, sheet.map(str::to_string), CellValue::Empty);
                vertex.name = Some(name.to_string());
                let id = self.graph.add_vertex(vertex);
                for address in target.range.cells() {
                    self.link_cell(id, sheet, address, true)?;
                }
                id
            }
        };
        self.graph.add_edge(parent, range_id);
        self.graph.bind_name(name, range_id);
        Ok(())
    }

    fn warn(&mut self, id: VertexId, message: String) {
        let vertex = self.graph.vertex(id);
        self.diagnostics
            .warning_at(vertex.label(), vertex.formula(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use pretty_assertions::assert_eq;
    use sheetc_core::{NamedRange, Worksheet};

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    fn build(sheet: &Worksheet) -> (Graph, Diagnostics) {
        let mut diags = Diagnostics::new();
        let graph = GraphBuilder::new()
            .build(sheet, |_, _| None, &mut diags)
            .unwrap();
        (graph, diags)
    }

    fn children_labels(graph: &Graph, a1: &str) -> Vec<String> {
        let id = graph.find_cell(addr(a1)).unwrap();
        graph
            .vertex(id)
            .children()
            .iter()
            .map(|c| graph.vertex(*c).label())
            .collect()
    }

    #[test]
    fn test_simple_edges() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 5.0).unwrap();
        sheet.set_cell_formula("B1", "=A1*2").unwrap();

        let (graph, diags) = build(&sheet);
        let a1 = graph.find_cell(addr("A1")).unwrap();
        let b1 = graph.find_cell(addr("B1")).unwrap();

        assert!(graph.vertex(b1).children().contains(&a1));
        assert!(graph.vertex(a1).parents().contains(&b1));
        assert!(graph.vertex(b1).parents().is_empty());
        assert!(!diags.has_errors());
    }

    #[test]
    fn test_range_expands_to_cells() {
        let mut sheet = Worksheet::new("Sheet1");
        for row in 1..=5 {
            sheet.set_cell_value(&format!("A{row}"), row as f64).unwrap();
        }
        sheet.set_cell_formula("B1", "=A1:A5").unwrap();

        let (graph, _) = build(&sheet);
        assert_eq!(
            children_labels(&graph, "B1"),
            vec!["A1", "A2", "A3", "A4", "A5"]
        );
        // No aggregate vertex for a plain range
        assert_eq!(graph.len(), 6);
    }

    #[test]
    fn test_blank_cells_in_range_are_skipped() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_value("A3", 3.0).unwrap();
        sheet.set_cell_formula("B1", "=SUM(A1:A3)").unwrap();

        let (graph, diags) = build(&sheet);
        assert_eq!(children_labels(&graph, "B1"), vec!["A1", "A3"]);
        assert!(!diags.has_errors());
    }

    #[test]
    fn test_missing_cell_is_logged_not_fatal() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_formula("B1", "=A1+Z9").unwrap();

        let (graph, diags) = build(&sheet);
        assert_eq!(children_labels(&graph, "B1"), vec!["A1"]);

        let error = diags.with_severity(Severity::Error).next().unwrap();
        assert_eq!(error.address.as_deref(), Some("B1"));
        assert_eq!(error.formula.as_deref(), Some("=A1+Z9"));
        assert!(error.message.contains("Z9"));
    }

    #[test]
    fn test_parse_error_keeps_building() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_formula("B1", "=A1+").unwrap();
        sheet.set_cell_formula("C1", "=A1*3").unwrap();

        let (graph, diags) = build(&sheet);
        let b1 = graph.find_cell(addr("B1")).unwrap();
        assert!(graph.vertex(b1).ast().is_none());
        assert_eq!(children_labels(&graph, "C1"), vec!["A1"]);
        assert_eq!(diags.count(Severity::Error), 1);
    }

    #[test]
    fn test_whole_column_is_rejected() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_formula("B1", "=SUM(A:A)").unwrap();

        let (graph, diags) = build(&sheet);
        assert!(graph.vertex(graph.find_cell(addr("B1")).unwrap()).ast().is_none());
        let error = diags.with_severity(Severity::Error).next().unwrap();
        assert!(error.message.contains("Unsupported range shape"));
    }

    #[test]
    fn test_unknown_function_arguments_not_linked() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_formula("B1", "=MYUDF(A1)+1").unwrap();

        let (graph, diags) = build(&sheet);
        assert!(children_labels(&graph, "B1").is_empty());
        assert_eq!(diags.count(Severity::Warning), 1);
    }

    #[test]
    fn test_external_references_are_resolved_once() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_formula("A1", "=Sheet2!B2+Sheet2!B2").unwrap();
        sheet.set_cell_formula("A2", "=sheet2!$B$2*2").unwrap();

        let mut calls = 0;
        let mut diags = Diagnostics::new();
        let graph = GraphBuilder::new()
            .build(
                &sheet,
                |s, a| {
                    calls += 1;
                    assert_eq!(s.to_lowercase(), "sheet2");
                    Some(CellHandle::new(a, CellValue::Number(7.0)))
                },
                &mut diags,
            )
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(graph.external_ids().len(), 1);
        let external = graph.externals().next().unwrap();
        assert_eq!(external.label(), "Sheet2!B2");
        assert_eq!(external.parents().len(), 2);
    }

    #[test]
    fn test_unresolved_external_drops_edge() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_formula("A1", "=Other!B2+1").unwrap();

        let (graph, diags) = build(&sheet);
        assert!(children_labels(&graph, "A1").is_empty());
        assert_eq!(graph.external_ids().len(), 0);
        assert_eq!(diags.count(Severity::Warning), 1);
    }

    #[test]
    fn test_sheet_prefix_scopes_whole_range() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_formula("B1", "=SUM('Sheet2'!A1:A8)+A1").unwrap();

        let mut diags = Diagnostics::new();
        let graph = GraphBuilder::new()
            .build(
                &sheet,
                |_, a| Some(CellHandle::new(a, CellValue::Number(1.0))),
                &mut diags,
            )
            .unwrap();

        assert_eq!(graph.external_ids().len(), 8);
        assert!(graph.externals().all(|v| v.sheet() == Some("Sheet2")));
        let local: Vec<_> = children_labels(&graph, "B1")
            .into_iter()
            .filter(|l| !l.contains('!'))
            .collect();
        assert_eq!(local, vec!["A1"]);
    }

    #[test]
    fn test_own_sheet_prefix_is_local() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_formula("B1", "=SHEET1!A1").unwrap();

        let (graph, _) = build(&sheet);
        assert_eq!(children_labels(&graph, "B1"), vec!["A1"]);
        assert!(graph.external_ids().is_empty());
    }

    #[test]
    fn test_named_ranges() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_value("A2", 2.0).unwrap();
        sheet.set_cell_value("B1", 0.2).unwrap();
        sheet.set_cell_formula("C1", "=SUM(Sales)*TaxRate").unwrap();

        let mut names = NamedRangeCollection::new();
        names
            .define(NamedRange::workbook_scope("Sales", "Sheet1!$A$1:$A$2"))
            .unwrap();
        names
            .define(NamedRange::workbook_scope("TaxRate", "$B$1"))
            .unwrap();

        let mut diags = Diagnostics::new();
        let graph = GraphBuilder::new()
            .with_names(&names, 0)
            .build(&sheet, |_, _| None, &mut diags)
            .unwrap();

        assert!(!diags.has_errors());
        let c1 = graph.find_cell(addr("C1")).unwrap();
        let sales = graph.find_name("SALES").unwrap();
        let tax = graph.find_name("taxrate").unwrap();

        assert_eq!(graph.vertex(sales).name(), Some("Sales"));
        assert_eq!(graph.vertex(sales).children().len(), 2);
        assert_eq!(graph.vertex(tax).label(), "B1");
        assert!(graph.vertex(c1).children().contains(&sales));
        assert!(graph.vertex(c1).children().contains(&tax));
    }

    #[test]
    fn test_unknown_name_is_logged() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_formula("A1", "=Missing*2").unwrap();

        let (_, diags) = build(&sheet);
        let error = diags.with_severity(Severity::Error).next().unwrap();
        assert!(error.message.contains("Missing"));
    }

    #[test]
    fn test_locale_normalization() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_formula("B1", "=ROUND(A1;2)*1,5").unwrap();

        let mut diags = Diagnostics::new();
        let graph = GraphBuilder::new()
            .normalize_locale(true)
            .build(&sheet, |_, _| None, &mut diags)
            .unwrap();

        assert!(!diags.has_errors());
        assert_eq!(children_labels(&graph, "B1"), vec!["A1"]);
        // Original text is kept for diagnostics
        let b1 = graph.vertex(graph.find_cell(addr("B1")).unwrap());
        assert_eq!(b1.formula(), Some("=ROUND(A1;2)*1,5"));
    }

    #[test]
    fn test_empty_source_is_an_error() {
        let sheet = Worksheet::new("Empty");
        let mut diags = Diagnostics::new();
        let result = GraphBuilder::new().build(&sheet, |_, _| None, &mut diags);
        assert!(matches!(result, Err(GraphError::EmptyInput(name)) if name == "Empty"));
    }

    #[test]
    fn test_deep_formula_is_walked_iteratively() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 1.0).unwrap();
        let formula = format!("={}", vec!["A1"; 2000].join("+"));
        sheet.set_cell_formula("B1", &formula).unwrap();

        let (graph, diags) = build(&sheet);
        assert!(!diags.has_errors());
        assert_eq!(children_labels(&graph, "B1"), vec!["A1"]);
    }
}
