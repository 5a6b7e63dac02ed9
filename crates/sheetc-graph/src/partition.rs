//! Class partitioning
//!
//! Every vertex reachable from an output field ends up in exactly one class:
//!
//! ```text
//! owned by one output field   -> that field's class (ClassB1, ClassC1, ...)
//! owned by two or more        -> Global
//! cell on another sheet       -> External
//! ```
//!
//! Each class is then sorted so dependencies come before the formulas that use
//! them. Only edges inside the class count; references into Global or External
//! are resolved by qualified access at generation time.

use std::fmt;

use ahash::AHashMap;

use crate::diagnostics::Diagnostics;
use crate::error::{GraphError, GraphResult};
use crate::graph::Graph;
use crate::naming::{class_name, variable_base, Namer};
use crate::vertex::VertexId;

/// Display colors, handed out in creation order
pub const PALETTE: &[&str] = &[
    "#4E79A7", "#F28E2B", "#E15759", "#76B7B2", "#59A14F", "#EDC948", "#B07AA1", "#FF9DA7",
    "#9C755F", "#BAB0AC",
];

/// Name of the shared class
pub const GLOBAL_CLASS: &str = "Global";
/// Name of the class holding cells from other sheets
pub const EXTERNAL_CLASS: &str = "External";

/// Index of a class in its [`Partition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Rooted at one output field
    Output,
    /// Vertices shared by several output fields
    Global,
    /// Cells from other sheets
    External,
}

/// A unit of generated code
#[derive(Debug, Clone)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub color: &'static str,
    pub kind: ClassKind,
    /// Root vertex; `None` for Global and External
    pub output: Option<VertexId>,
    /// Members in emission order
    pub vertices: Vec<VertexId>,
    /// Members left unsorted because they sit on a cycle
    pub cyclic: Vec<VertexId>,
}

impl Class {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_shared(&self) -> bool {
        self.output.is_none()
    }

    pub fn has_cycle(&self) -> bool {
        !self.cyclic.is_empty()
    }
}

/// Result of partitioning a graph
#[derive(Debug, Clone, Default)]
pub struct Partition {
    classes: Vec<Class>,
}

impl Partition {
    /// Classes in creation order: output classes, then Global, then External
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Class> {
        self.classes.iter()
    }

    pub fn get(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id.index())
    }

    pub fn by_name(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn global(&self) -> Option<&Class> {
        self.classes.iter().find(|c| c.kind == ClassKind::Global)
    }

    pub fn external(&self) -> Option<&Class> {
        self.classes.iter().find(|c| c.kind == ClassKind::External)
    }

    /// Sum of class sizes
    pub fn vertex_count(&self) -> usize {
        self.classes.iter().map(Class::len).sum()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Outcome of [`topological_sort`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOutcome {
    /// Dependencies before dependents; cycle members come first, in input order
    pub order: Vec<VertexId>,
    /// Members that could not be sorted
    pub cyclic: Vec<VertexId>,
}

/// Sort `members` so every vertex follows the members it references
///
/// Kahn's algorithm over edges with both ends in `members`. The frontier holds
/// members with no remaining in-set parents; the member with the fewest in-set
/// children is taken first, ties going to the earlier member. The collected list
/// runs dependents first and is reversed at the end. Members left over when the
/// frontier runs dry lie on or behind a cycle; they are returned in `cyclic` and
/// placed, in input order, ahead of the sorted part.
pub fn topological_sort(graph: &Graph, members: &[VertexId]) -> SortOutcome {
    let position: AHashMap<VertexId, usize> = members
        .iter()
        .enumerate()
        .map(|(pos, id)| (*id, pos))
        .collect();

    let children: Vec<Vec<usize>> = members
        .iter()
        .map(|id| {
            graph
                .vertex(*id)
                .children()
                .iter()
                .filter_map(|child| position.get(child).copied())
                .collect()
        })
        .collect();

    let mut in_degree = vec![0usize; members.len()];
    for kids in &children {
        for &child in kids {
            in_degree[child] += 1;
        }
    }

    let mut frontier: Vec<usize> = (0..members.len()).filter(|p| in_degree[*p] == 0).collect();
    let mut collected = Vec::with_capacity(members.len());
    let mut done = vec![false; members.len()];

    while let Some(slot) = frontier
        .iter()
        .enumerate()
        .min_by_key(|(_, pos)| (children[**pos].len(), **pos))
        .map(|(slot, _)| slot)
    {
        let pos = frontier.swap_remove(slot);
        done[pos] = true;
        collected.push(pos);
        for &child in &children[pos] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                frontier.push(child);
            }
        }
    }

    let cyclic: Vec<usize> = (0..members.len()).filter(|p| !done[*p]).collect();
    collected.extend(cyclic.iter().rev());
    collected.reverse();

    SortOutcome {
        order: collected.into_iter().map(|pos| members[pos]).collect(),
        cyclic: cyclic.into_iter().map(|pos| members[pos]).collect(),
    }
}

/// Splits a graph into classes
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassPartitioner;

impl ClassPartitioner {
    pub fn new() -> Self {
        Self
    }

    /// Partition the graph's live vertices
    ///
    /// Assigns each vertex its class and a unique variable name. Per-class
    /// problems (cycles, a count mismatch) are logged and do not fail the call.
    pub fn partition(
        &self,
        graph: &mut Graph,
        diagnostics: &mut Diagnostics,
    ) -> GraphResult<Partition> {
        if graph.vertices().chain(graph.externals()).any(|v| v.class().is_some()) {
            return Err(GraphError::AlreadyPartitioned);
        }

        let roots = graph.output_fields();
        if roots.is_empty() {
            diagnostics.warning(format!(
                "No output fields in '{}'; nothing to generate",
                graph.sheet_name()
            ));
        }

        // Reachable sets and the owner count of every reachable vertex
        let mut reach: Vec<(VertexId, Vec<VertexId>)> = Vec::new();
        let mut owners: AHashMap<VertexId, usize> = AHashMap::new();
        let mut discovered: Vec<VertexId> = Vec::new();
        for &root in &roots {
            if graph.vertex(root).children().is_empty() {
                continue;
            }
            let set = graph.reachable(root, false);
            for &id in &set {
                let count = owners.entry(id).or_insert(0);
                if *count == 0 {
                    discovered.push(id);
                }
                *count += 1;
            }
            reach.push((root, set));
        }

        let mut namer = Namer::new();
        let mut classes: Vec<Class> = Vec::new();

        for &root in &roots {
            let name = namer.claim(&class_name(graph.vertex(root)));
            if graph.vertex(root).children().is_empty() {
                if owners.contains_key(&root) {
                    tracing::debug!("Output field {name} is owned by another output field");
                    continue;
                }
                push_class(
                    &mut classes,
                    name,
                    ClassKind::Output,
                    Some(root),
                    vec![root],
                    Vec::new(),
                );
                continue;
            }

            let Some((_, set)) = reach.iter().find(|(r, _)| *r == root) else {
                continue;
            };
            let members: Vec<VertexId> = set
                .iter()
                .copied()
                .filter(|id| owners.get(id) == Some(&1))
                .collect();
            if members.is_empty() {
                tracing::debug!("Every vertex of {name} is shared; no class created");
                continue;
            }
            let sorted = self.sort_class(graph, &name, &members, diagnostics);
            push_class(
                &mut classes,
                name,
                ClassKind::Output,
                Some(root),
                sorted.order,
                sorted.cyclic,
            );
        }

        let shared: Vec<VertexId> = discovered
            .iter()
            .copied()
            .filter(|id| owners.get(id).copied().unwrap_or(0) > 1)
            .collect();
        if !shared.is_empty() {
            let sorted = self.sort_class(graph, GLOBAL_CLASS, &shared, diagnostics);
            push_class(
                &mut classes,
                GLOBAL_CLASS.to_string(),
                ClassKind::Global,
                None,
                sorted.order,
                sorted.cyclic,
            );
        }

        let externals = graph.external_ids().to_vec();
        if !externals.is_empty() {
            push_class(
                &mut classes,
                EXTERNAL_CLASS.to_string(),
                ClassKind::External,
                None,
                externals,
                Vec::new(),
            );
        }

        for class in &classes {
            for &id in &class.vertices {
                graph.vertex_mut(id).assign_class(class.id);
            }
        }
        for class in &classes {
            for &id in &class.vertices {
                let name = namer.claim(&variable_base(graph.vertex(id)));
                graph.vertex_mut(id).assign_variable_name(name);
            }
        }

        let partition = Partition { classes };
        let childless = roots
            .iter()
            .filter(|r| graph.vertex(**r).children().is_empty() && !owners.contains_key(*r))
            .count();
        let expected = discovered.len() + childless + graph.external_ids().len();
        let actual = partition.vertex_count();
        if expected != actual {
            diagnostics.error(format!(
                "Partition is inconsistent: {actual} vertices in classes, {expected} reachable"
            ));
        } else {
            diagnostics.success(format!(
                "Partitioned {actual} vertices into {} classes",
                partition.len()
            ));
        }

        Ok(partition)
    }

    fn sort_class(
        &self,
        graph: &Graph,
        name: &str,
        members: &[VertexId],
        diagnostics: &mut Diagnostics,
    ) -> SortOutcome {
        let sorted = topological_sort(graph, members);
        if let Some(first) = sorted.cyclic.first() {
            let labels: Vec<String> = sorted
                .cyclic
                .iter()
                .map(|id| graph.vertex(*id).label())
                .collect();
            let vertex = graph.vertex(*first);
            diagnostics.error_at(
                vertex.label(),
                vertex.formula(),
                format!(
                    "Circular reference in {name} involving {}; emission order is best effort",
                    labels.join(", ")
                ),
            );
        }
        sorted
    }
}

fn push_class(
    classes: &mut Vec<Class>,
    name: String,
    kind: ClassKind,
    output: Option<VertexId>,
    vertices: Vec<VertexId>,
    cyclic: Vec<VertexId>,
) {
    let id = ClassId(classes.len() as u32);
    tracing::debug!("Created class {name} with {} vertices", vertices.len());
    classes.push(Class {
        id,
        name,
        color: PALETTE[id.index() % PALETTE.len()],
        kind,
        output,
        vertices,
        cyclic,
    });
}
