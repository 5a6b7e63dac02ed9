//! Dependency graph
//!
//! The graph owns every vertex in an arena. Two lists select which vertices are
//! live: `active` holds cells and ranges of the sheet being compiled, `externals`
//! holds cells pulled in from other sheets. Filtering replaces both lists but never
//! shrinks the arena, so a [`VertexId`] stays valid for the life of the graph.

use ahash::{AHashMap, AHashSet};
use sheetc_core::CellAddress;

use crate::vertex::{NodeType, Vertex, VertexId, VertexKey};

/// Dependency graph for one worksheet
#[derive(Debug, Clone)]
pub struct Graph {
    sheet: String,
    vertices: Vec<Vertex>,
    index: AHashMap<VertexKey, VertexId>,
    names: AHashMap<String, VertexId>,
    active: Vec<VertexId>,
    externals: Vec<VertexId>,
    roots: Option<Vec<VertexId>>,
    rows: Vec<u32>,
    columns: Vec<u32>,
}

impl Graph {
    /// Create an empty graph for the named sheet
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            vertices: Vec::new(),
            index: AHashMap::new(),
            names: AHashMap::new(),
            active: Vec::new(),
            externals: Vec::new(),
            roots: None,
            rows: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Name of the sheet being compiled
    pub fn sheet_name(&self) -> &str {
        &self.sheet
    }

    /// Whether a sheet qualifier names the sheet being compiled
    pub fn is_local_sheet(&self, sheet: &str) -> bool {
        sheet.eq_ignore_ascii_case(&self.sheet)
    }

    /// Get a vertex by id
    ///
    /// # Panics
    /// If the id was not produced by this graph
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    pub fn get(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.index()]
    }

    /// Look up a vertex by identity
    pub fn find(&self, key: &VertexKey) -> Option<VertexId> {
        self.index.get(key).copied()
    }

    /// Look up a cell on the sheet being compiled
    pub fn find_cell(&self, address: CellAddress) -> Option<VertexId> {
        self.find(&VertexKey::cell(address))
    }

    /// Look up the vertex a defined name resolved to during the build
    pub fn find_name(&self, name: &str) -> Option<VertexId> {
        self.names.get(&name.to_lowercase()).copied()
    }

    /// Active vertices of the sheet being compiled
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.active.iter().map(|id| self.vertex(*id))
    }

    /// Active external vertices
    pub fn externals(&self) -> impl Iterator<Item = &Vertex> {
        self.externals.iter().map(|id| self.vertex(*id))
    }

    pub fn active_ids(&self) -> &[VertexId] {
        &self.active
    }

    pub fn external_ids(&self) -> &[VertexId] {
        &self.externals
    }

    /// Number of live vertices, externals included
    pub fn len(&self) -> usize {
        self.active.len() + self.externals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the id is in either live list
    pub fn is_live(&self, id: VertexId) -> bool {
        self.active.contains(&id) || self.externals.contains(&id)
    }

    /// Roots of the generated units
    ///
    /// After [`Graph::filter`] these are the filter's roots; before, every active
    /// vertex whose derived role is [`NodeType::OutputField`].
    pub fn output_fields(&self) -> Vec<VertexId> {
        match &self.roots {
            Some(roots) => roots.clone(),
            None => self
                .active
                .iter()
                .copied()
                .filter(|id| self.vertex(*id).node_type() == Some(NodeType::OutputField))
                .collect(),
        }
    }

    /// Sorted distinct 1-based row numbers of active cells
    pub fn populated_rows(&self) -> &[u32] {
        &self.rows
    }

    /// Sorted distinct 1-based column numbers of active cells
    pub fn populated_columns(&self) -> &[u32] {
        &self.columns
    }

    /// Every vertex reachable from `root` by following children, root first
    ///
    /// Externals are left out unless `include_external` is set. Cycles terminate
    /// through the visited set.
    pub fn reachable(&self, root: VertexId, include_external: bool) -> Vec<VertexId> {
        let mut visited = AHashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let vertex = self.vertex(id);
            if vertex.is_external() && !include_external {
                continue;
            }
            order.push(id);
            // Reverse so children are visited in ascending id order
            for child in vertex.children().iter().rev() {
                if !visited.contains(child) {
                    stack.push(*child);
                }
            }
        }

        order
    }

    /// Keep only what the roots transitively reference
    ///
    /// Replaces the active list with the union of the roots' reachable sets and
    /// keeps an external only if one of its parents survived. Parent links to
    /// dropped vertices are detached, so a root that had a consumer outside the
    /// kept set becomes a true output field. Filtering again with the same roots
    /// changes nothing.
    pub fn filter(&mut self, roots: &[VertexId]) {
        let mut kept = AHashSet::new();
        let mut active = Vec::new();
        let mut valid_roots = Vec::new();

        for &root in roots {
            if self.get(root).map_or(true, Vertex::is_external) {
                tracing::debug!("Ignoring filter root {root}: not a local vertex");
                continue;
            }
            if !valid_roots.contains(&root) {
                valid_roots.push(root);
            }
            for id in self.reachable(root, false) {
                if kept.insert(id) {
                    active.push(id);
                }
            }
        }

        let externals: Vec<VertexId> = self
            .externals
            .iter()
            .copied()
            .filter(|id| self.vertex(*id).parents().iter().any(|p| kept.contains(p)))
            .collect();

        for id in active.iter().chain(externals.iter()) {
            self.vertices[id.index()]
                .parents
                .retain(|parent| kept.contains(parent));
        }

        tracing::debug!(
            "Filtered '{}' to {} of {} vertices and {} of {} externals",
            self.sheet,
            active.len(),
            self.active.len(),
            externals.len(),
            self.externals.len()
        );

        self.active = active;
        self.externals = externals;
        self.roots = Some(valid_roots);
        self.recompute_layout();
    }

    /// Drop isolated literals from the active list
    ///
    /// Single-pass alternative to [`Graph::filter`] for callers that want every
    /// unit in the sheet.
    pub fn prune_unreferenced(&mut self) {
        let before = self.active.len();
        let vertices = &self.vertices;
        self.active
            .retain(|id| vertices[id.index()].node_type().is_some());
        tracing::debug!(
            "Pruned {} unreferenced vertices from '{}'",
            before - self.active.len(),
            self.sheet
        );
        self.recompute_layout();
    }

    pub(crate) fn add_vertex(&mut self, mut vertex: Vertex) -> VertexId {
        if let Some(id) = self.index.get(&vertex.key) {
            return *id;
        }
        let id = VertexId(self.vertices.len() as u32);
        vertex.id = id;
        self.index.insert(vertex.key.clone(), id);
        if vertex.is_external() {
            self.externals.push(id);
        } else {
            self.active.push(id);
        }
        self.vertices.push(vertex);
        id
    }

    /// Record `parent -> child`; sets dedupe repeated references
    pub(crate) fn add_edge(&mut self, parent: VertexId, child: VertexId) {
        self.vertices[parent.index()].children.insert(child);
        self.vertices[child.index()].parents.insert(parent);
    }

    pub(crate) fn bind_name(&mut self, name: &str, id: VertexId) {
        self.names.insert(name.to_lowercase(), id);
    }

    pub(crate) fn recompute_layout(&mut self) {
        let mut rows = Vec::new();
        let mut columns = Vec::new();
        for vertex in self.vertices() {
            if let Some(address) = vertex.address() {
                rows.push(address.row_number());
                columns.push(address.column_number());
            }
        }
        rows.sort_unstable();
        rows.dedup();
        columns.sort_unstable();
        columns.dedup();
        self.rows = rows;
        self.columns = columns;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetc_core::CellValue;

    fn cell(graph: &mut Graph, a1: &str, value: CellValue) -> VertexId {
        let address = CellAddress::parse(a1).unwrap();
        graph.add_vertex(Vertex::new(VertexKey::cell(address), None, value))
    }

    /// A1 <- B1 <- C1, D1 unrelated
    fn chain() -> (Graph, [VertexId; 4]) {
        let mut graph = Graph::new("Sheet1");
        let a1 = cell(&mut graph, "A1", CellValue::Number(1.0));
        let b1 = cell(&mut graph, "B1", CellValue::formula("=A1+1"));
        let c1 = cell(&mut graph, "C1", CellValue::formula("=B1+1"));
        let d1 = cell(&mut graph, "D3", CellValue::Number(4.0));
        graph.add_edge(b1, a1);
        graph.add_edge(c1, b1);
        graph.recompute_layout();
        (graph, [a1, b1, c1, d1])
    }

    #[test]
    fn test_reachable_order() {
        let (graph, [a1, b1, c1, _]) = chain();
        assert_eq!(graph.reachable(c1, false), vec![c1, b1, a1]);
        assert_eq!(graph.reachable(a1, false), vec![a1]);
    }

    #[test]
    fn test_reachable_terminates_on_cycle() {
        let (mut graph, [a1, b1, c1, _]) = chain();
        graph.add_edge(a1, c1);
        assert_eq!(graph.reachable(c1, false).len(), 3);
        assert_eq!(graph.reachable(b1, false).len(), 3);
    }

    #[test]
    fn test_output_fields_and_prune() {
        let (mut graph, [_, _, c1, d1]) = chain();
        assert_eq!(graph.output_fields(), vec![c1]);
        assert_eq!(graph.populated_rows(), &[1, 3]);

        graph.prune_unreferenced();
        assert_eq!(graph.len(), 3);
        assert!(!graph.is_live(d1));
        assert_eq!(graph.populated_rows(), &[1]);
        assert_eq!(graph.populated_columns(), &[1, 2, 3]);
    }

    #[test]
    fn test_filter_detaches_dropped_parents() {
        let (mut graph, [a1, b1, c1, _]) = chain();
        graph.filter(&[b1]);

        assert_eq!(graph.active_ids(), &[b1, a1]);
        assert!(!graph.is_live(c1));
        assert!(graph.vertex(b1).parents().is_empty());
        assert_eq!(graph.vertex(b1).node_type(), Some(NodeType::OutputField));
        assert_eq!(graph.output_fields(), vec![b1]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let (mut graph, [_, b1, c1, _]) = chain();
        graph.filter(&[c1, b1]);
        let once = graph.active_ids().to_vec();
        graph.filter(&[c1, b1]);
        assert_eq!(graph.active_ids(), once.as_slice());
    }
}
