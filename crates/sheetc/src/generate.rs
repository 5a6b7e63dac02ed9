//! Workbook to source pipeline
//!
//! Runs the stages in order: build the dependency graph of the active sheet,
//! optionally narrow it to chosen output cells, partition it into classes, then
//! translate and print.
//!
//! # Example
//!
//! ```rust
//! use sheetc::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 10.0).unwrap();
//! sheet.set_cell_formula("B1", "=A1+1").unwrap();
//! sheet.set_cell_formula("C1", "=A1+2").unwrap();
//!
//! let generation = workbook.generate(&GenerateOptions::default()).unwrap();
//! assert_eq!(generation.stats.classes, 3);
//! assert!(generation.source.contains("pub struct Global"));
//! ```

use sheetc_codegen::{build_program_with, CodeEmitter, CodegenOptions, Program, RustEmitter};
use sheetc_core::{CellAddress, Workbook};
use sheetc_formula::FunctionRegistry;
use sheetc_graph::{ClassPartitioner, Diagnostics, Graph, GraphBuilder, Partition, Severity};

use crate::error::{GenerateError, GenerateResult};

/// Options for [`generate`]
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Cells to generate; `None` generates every output field of the sheet
    pub outputs: Option<Vec<CellAddress>>,
    /// Rewrite comma-decimal formulas (`=1,5+A1`) before parsing
    pub normalize_locale: bool,
    /// Options passed to the emitter
    pub codegen: CodegenOptions,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate only what `outputs` depend on
    pub fn with_outputs(mut self, outputs: Vec<CellAddress>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    pub fn with_locale_normalization(mut self, enabled: bool) -> Self {
        self.normalize_locale = enabled;
        self
    }

    pub fn with_codegen(mut self, codegen: CodegenOptions) -> Self {
        self.codegen = codegen;
        self
    }
}

/// Counters from a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Cells of the active sheet in the graph
    pub vertices: usize,
    /// Cells pulled in from other sheets
    pub externals: usize,
    pub classes: usize,
    /// Formulas translated into statements
    pub statements: usize,
    /// Statements holding at least one placeholder
    pub placeholders: usize,
    /// Classes whose order is best effort because of a cycle
    pub cyclic_classes: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Everything a generation run produced
#[derive(Debug, Clone)]
pub struct Generation {
    /// Dependency graph after filtering, with classes and variable names assigned
    pub graph: Graph,
    pub program: Program,
    pub partition: Partition,
    /// Printed source
    pub source: String,
    pub diagnostics: Diagnostics,
    pub stats: GenerationStats,
}

/// Generate source for the active sheet of `workbook`
///
/// Fails only when there is nothing to generate from; per-formula problems end
/// up in [`Generation::diagnostics`].
pub fn generate(workbook: &Workbook, options: &GenerateOptions) -> GenerateResult<Generation> {
    generate_with(workbook, options, FunctionRegistry::builtins())
}

/// [`generate`] with a custom function registry
pub fn generate_with(
    workbook: &Workbook,
    options: &GenerateOptions,
    functions: &FunctionRegistry,
) -> GenerateResult<Generation> {
    let index = workbook.active_sheet();
    let sheet = workbook
        .worksheet(index)
        .ok_or(GenerateError::NoActiveSheet)?;
    if sheet.is_empty() {
        return Err(GenerateError::EmptySheet(sheet.name().to_string()));
    }

    let mut diagnostics = Diagnostics::new();
    let mut graph = GraphBuilder::new()
        .with_names(workbook.named_ranges(), index)
        .normalize_locale(options.normalize_locale)
        .with_functions(functions)
        .build(
            sheet,
            |name, address| workbook.resolve_external(name, address),
            &mut diagnostics,
        )?;

    if let Some(outputs) = &options.outputs {
        let mut roots = Vec::with_capacity(outputs.len());
        for address in outputs {
            match graph.find_cell(*address) {
                Some(id) => roots.push(id),
                None => diagnostics.warning(format!(
                    "Output {} is not a populated cell of '{}'",
                    address.to_relative_string(),
                    sheet.name()
                )),
            }
        }
        graph.filter(&roots);
    }

    let partition = ClassPartitioner::new().partition(&mut graph, &mut diagnostics)?;
    let program = build_program_with(&graph, &partition, functions, &mut diagnostics)?;
    let source = RustEmitter::new(options.codegen.clone()).emit(&program)?;

    let stats = GenerationStats {
        vertices: graph.active_ids().len(),
        externals: graph.external_ids().len(),
        classes: partition.len(),
        statements: program.units.iter().map(|u| u.statements.len()).sum(),
        placeholders: program.placeholder_count(),
        cyclic_classes: partition.iter().filter(|c| c.has_cycle()).count(),
        warnings: diagnostics.count(Severity::Warning),
        errors: diagnostics.count(Severity::Error),
    };
    tracing::info!(
        "Generated {} classes and {} statements from '{}'",
        stats.classes,
        stats.statements,
        sheet.name()
    );
    if stats.errors > 0 {
        tracing::warn!("{} errors while generating '{}'", stats.errors, sheet.name());
    }

    Ok(Generation {
        graph,
        program,
        partition,
        source,
        diagnostics,
        stats,
    })
}

/// Extension trait adding generation to [`Workbook`]
pub trait WorkbookGenerateExt {
    /// Generate source for the active sheet
    fn generate(&self, options: &GenerateOptions) -> GenerateResult<Generation>;
}

impl WorkbookGenerateExt for Workbook {
    fn generate(&self, options: &GenerateOptions) -> GenerateResult<Generation> {
        generate(self, options)
    }
}
