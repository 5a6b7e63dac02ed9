//! # sheetc-codegen
//!
//! Code generation for sheetc.
//!
//! Given a partitioned graph this crate:
//! - infers a static type for every vertex ([`TypeTable`])
//! - translates each formula into a target-neutral [`Expr`] ([`Translator`])
//! - assembles classes into a [`Program`] ([`build_program`])
//! - prints the program as Rust source ([`RustEmitter`])
//!
//! ## Example
//!
//! ```rust
//! use sheetc_codegen::{generate_source, CodegenOptions};
//! use sheetc_core::Worksheet;
//! use sheetc_graph::{ClassPartitioner, Diagnostics, GraphBuilder};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet.set_cell_value("A1", 5.0).unwrap();
//! sheet.set_cell_formula("B1", "=A1*2").unwrap();
//!
//! let mut diagnostics = Diagnostics::new();
//! let mut graph = GraphBuilder::new()
//!     .build(&sheet, |_, _| None, &mut diagnostics)
//!     .unwrap();
//! let partition = ClassPartitioner::new()
//!     .partition(&mut graph, &mut diagnostics)
//!     .unwrap();
//!
//! let code = generate_source(&graph, &partition, &CodegenOptions::default(), &mut diagnostics)
//!     .unwrap();
//! assert!(code.contains("let b1: f64 = a1 * 2.0;"));
//! ```

pub mod emit;
pub mod error;
pub mod expr;
pub mod options;
pub mod program;
pub mod translate;
pub mod types;

pub use emit::{CodeEmitter, RustEmitter};
pub use error::{CodegenError, CodegenResult};
pub use expr::{BinaryOp, Expr, UnaryOp, ValueType};
pub use options::CodegenOptions;
pub use program::{
    build_program, build_program_with, instance_name, ClassUnit, Field, OutputBinding,
    Parameter, Program, Statement,
};
pub use translate::{Translation, Translator};
pub use types::{infer_type, InferContext, TypeTable, MAX_DEPTH};

use sheetc_graph::{Diagnostics, Graph, Partition};

/// Build and print the program for a partitioned graph in one step
pub fn generate_source(
    graph: &Graph,
    partition: &Partition,
    options: &CodegenOptions,
    diagnostics: &mut Diagnostics,
) -> CodegenResult<String> {
    let program = build_program(graph, partition, diagnostics)?;
    let code = RustEmitter::new(options.clone()).emit(&program)?;
    tracing::debug!(
        "Emitted {} units for '{}' ({} bytes)",
        program.units.len(),
        program.sheet,
        code.len()
    );
    Ok(code)
}
