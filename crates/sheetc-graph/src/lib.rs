//! # sheetc-graph
//!
//! Dependency graph for sheetc.
//!
//! The pipeline this crate covers:
//!
//! 1. [`GraphBuilder`] reads a worksheet and links every formula to the cells it
//!    references, pulling cells from other sheets in through a resolver.
//! 2. [`Graph::filter`] keeps only what the chosen output fields depend on.
//! 3. [`ClassPartitioner`] splits the rest into classes and orders each one.
//!
//! ## Example
//!
//! ```rust
//! use sheetc_core::Worksheet;
//! use sheetc_graph::{ClassPartitioner, Diagnostics, GraphBuilder};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet.set_cell_value("A1", 10.0).unwrap();
//! sheet.set_cell_formula("B1", "=A1+1").unwrap();
//! sheet.set_cell_formula("C1", "=A1+2").unwrap();
//!
//! let mut diagnostics = Diagnostics::new();
//! let mut graph = GraphBuilder::new()
//!     .build(&sheet, |_, _| None, &mut diagnostics)
//!     .unwrap();
//! let partition = ClassPartitioner::new()
//!     .partition(&mut graph, &mut diagnostics)
//!     .unwrap();
//!
//! let names: Vec<_> = partition.iter().map(|c| c.name.as_str()).collect();
//! assert_eq!(names, ["ClassB1", "ClassC1", "Global"]);
//! ```

pub mod builder;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod naming;
pub mod partition;
pub mod vertex;

pub use builder::GraphBuilder;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{GraphError, GraphResult};
pub use graph::Graph;
pub use naming::Namer;
pub use partition::{
    topological_sort, Class, ClassId, ClassKind, ClassPartitioner, Partition, SortOutcome,
    EXTERNAL_CLASS, GLOBAL_CLASS, PALETTE,
};
pub use vertex::{Location, NodeType, Vertex, VertexId, VertexKey, VertexKind};
