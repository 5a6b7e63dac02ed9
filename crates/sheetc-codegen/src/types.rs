//! Type inference
//!
//! [`infer_type`] works out what a formula node evaluates to without producing
//! code. It only reads the tree and a [`TypeTable`], so the same inputs always
//! give the same answer. The table itself is filled once, before translation,
//! in dependency order: External, then Global, then each output class in its
//! sorted order.

use ahash::AHashMap;
use sheetc_core::{CellAddress, CellRange, CellType};
use sheetc_formula::{BinaryOperator, FormulaExpr, FunctionRegistry};
use sheetc_graph::{Graph, Partition, VertexId, VertexKey, VertexKind};

use crate::expr::ValueType;

/// Nesting bound for inference and translation
pub const MAX_DEPTH: usize = 256;

/// Inferred type of every generated vertex
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: AHashMap<VertexId, ValueType>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infer every class member, dependencies first
    pub fn build(graph: &Graph, partition: &Partition, functions: &FunctionRegistry) -> Self {
        let mut table = Self::new();
        let order = partition
            .external()
            .into_iter()
            .chain(partition.global())
            .chain(partition.iter().filter(|c| !c.is_shared()));

        for class in order {
            for &id in &class.vertices {
                let vertex = graph.vertex(id);
                let ty = if vertex.kind() == VertexKind::Range {
                    ValueType::Dynamic
                } else if vertex.is_external() || !vertex.is_formula() {
                    ValueType::from_cell_type(Some(vertex.cell_type()))
                } else {
                    let inferred = vertex.ast().and_then(|ast| {
                        infer_type(ast, &InferContext::new(graph, &table, functions))
                    });
                    ValueType::from_cell_type(inferred)
                };
                tracing::trace!("{} is {ty}", vertex.label());
                table.insert(id, ty);
            }
        }
        table
    }

    /// Type of a vertex; anything not recorded is dynamic
    pub fn get(&self, id: VertexId) -> ValueType {
        self.types.get(&id).copied().unwrap_or(ValueType::Dynamic)
    }

    /// Recorded type, `None` when unknown
    pub fn cell_type(&self, id: VertexId) -> Option<CellType> {
        self.types.get(&id).and_then(|ty| ty.cell_type())
    }

    pub fn insert(&mut self, id: VertexId, ty: ValueType) {
        self.types.insert(id, ty);
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Everything [`infer_type`] may look at
#[derive(Clone, Copy)]
pub struct InferContext<'a> {
    pub graph: &'a Graph,
    pub types: &'a TypeTable,
    pub functions: &'a FunctionRegistry,
}

impl<'a> InferContext<'a> {
    pub fn new(graph: &'a Graph, types: &'a TypeTable, functions: &'a FunctionRegistry) -> Self {
        Self {
            graph,
            types,
            functions,
        }
    }
}

/// Result type of `node`; `None` when operand types disagree or cannot be known
pub fn infer_type(node: &FormulaExpr, ctx: &InferContext<'_>) -> Option<CellType> {
    infer(node, None, ctx, 0)
}

fn infer(
    node: &FormulaExpr,
    sheet: Option<&str>,
    ctx: &InferContext<'_>,
    depth: usize,
) -> Option<CellType> {
    if depth > MAX_DEPTH {
        return None;
    }
    let depth = depth + 1;
    match node {
        FormulaExpr::Number(_) => Some(CellType::Number),
        FormulaExpr::String(_) => Some(CellType::Text),
        FormulaExpr::Boolean(_) => Some(CellType::Bool),
        FormulaExpr::Error(_)
        | FormulaExpr::Missing
        | FormulaExpr::RangeRef(_)
        | FormulaExpr::Array(_) => None,
        FormulaExpr::CellRef(address) => {
            resolve_cell(ctx.graph, sheet, *address).and_then(|id| ctx.types.cell_type(id))
        }
        FormulaExpr::NameRef(name) => {
            scalar_name(ctx.graph, name).and_then(|id| ctx.types.cell_type(id))
        }
        FormulaExpr::Sheet { sheet, reference } => {
            infer(reference, Some(sheet.as_str()), ctx, depth)
        }
        FormulaExpr::Paren(inner) => infer(inner, sheet, ctx, depth),
        FormulaExpr::UnaryOp { .. } => Some(CellType::Number),
        FormulaExpr::BinaryOp { op, left, right } => match op {
            BinaryOperator::Add | BinaryOperator::Subtract => {
                let l = infer_operand(left, sheet, ctx, depth);
                let r = infer_operand(right, sheet, ctx, depth);
                additive_type(*op, l, r)
            }
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Power => {
                Some(CellType::Number)
            }
            BinaryOperator::Concat => Some(CellType::Text),
            BinaryOperator::Range => None,
            _ => Some(CellType::Bool),
        },
        FormulaExpr::Function { name, args } => {
            let def = ctx.functions.get(name)?;
            if !def.accepts(args.len()) {
                return None;
            }
            match def.name {
                "IF" => {
                    let branch = |arg: &FormulaExpr| match arg {
                        FormulaExpr::Missing => Some(CellType::Number),
                        arg => infer(arg, sheet, ctx, depth),
                    };
                    let then_type = branch(&args[1]);
                    let else_type = match args.get(2) {
                        Some(arg) => branch(arg),
                        None => Some(CellType::Bool),
                    };
                    if then_type == else_type {
                        then_type
                    } else {
                        None
                    }
                }
                other => function_type(other),
            }
        }
    }
}

/// Operand of `+`/`-`: numeric text literals count as numbers
fn infer_operand(
    node: &FormulaExpr,
    sheet: Option<&str>,
    ctx: &InferContext<'_>,
    depth: usize,
) -> Option<CellType> {
    if numeric_literal(node).is_some() {
        return Some(CellType::Number);
    }
    infer(node, sheet, ctx, depth)
}

/// Result of `+` or `-` over two operand types
pub(crate) fn additive_type(
    op: BinaryOperator,
    left: Option<CellType>,
    right: Option<CellType>,
) -> Option<CellType> {
    let numeric = |t: Option<CellType>| matches!(t, Some(CellType::Number | CellType::Bool));
    let date = |t: Option<CellType>| t == Some(CellType::Date);
    match op {
        BinaryOperator::Add if date(left) && numeric(right) => Some(CellType::Date),
        BinaryOperator::Add if numeric(left) && date(right) => Some(CellType::Date),
        BinaryOperator::Subtract if date(left) && numeric(right) => Some(CellType::Date),
        BinaryOperator::Subtract if date(left) && date(right) => Some(CellType::Number),
        _ if numeric(left) && numeric(right) => Some(CellType::Number),
        _ => None,
    }
}

/// Result type of a built-in function other than IF
pub(crate) fn function_type(name: &str) -> Option<CellType> {
    match name {
        "SUM" | "AVERAGE" | "MIN" | "MAX" | "COUNT" | "COUNTA" | "PRODUCT" | "ABS" | "ROUND"
        | "ROUNDUP" | "ROUNDDOWN" | "INT" | "MOD" | "POWER" | "SQRT" | "EXP" | "LN" | "LOG10"
        | "PI" | "SIGN" | "LEN" | "YEAR" | "MONTH" | "DAY" => Some(CellType::Number),
        "AND" | "OR" | "NOT" | "TRUE" | "FALSE" | "ISBLANK" | "ISNUMBER" | "ISTEXT" | "EXACT" => {
            Some(CellType::Bool)
        }
        "CONCATENATE" | "LEFT" | "RIGHT" | "MID" | "UPPER" | "LOWER" | "TRIM" => {
            Some(CellType::Text)
        }
        "DATE" | "TODAY" | "NOW" => Some(CellType::Date),
        _ => None,
    }
}

/// Value of a text literal that reads as a number, such as `"2%"` or `"1.5"`
pub(crate) fn numeric_literal(node: &FormulaExpr) -> Option<f64> {
    let FormulaExpr::String(text) = node.unparenthesized() else {
        return None;
    };
    let text = text.trim();
    let value = match text.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f64>().ok().map(|n| n / 100.0),
        None => text.parse::<f64>().ok(),
    };
    value.filter(|n| n.is_finite())
}

/// Vertex for a cell, honoring the enclosing sheet qualifier
pub(crate) fn resolve_cell(
    graph: &Graph,
    sheet: Option<&str>,
    address: CellAddress,
) -> Option<VertexId> {
    match sheet.filter(|s| !graph.is_local_sheet(s)) {
        Some(sheet) => graph.find(&VertexKey::external(sheet, address)),
        None => graph.find_cell(address),
    }
}

/// Cell vertex a defined name resolved to; `None` for multi-cell names
pub(crate) fn scalar_name(graph: &Graph, name: &str) -> Option<VertexId> {
    graph
        .find_name(name)
        .filter(|id| graph.vertex(*id).kind() == VertexKind::Cell)
}

/// A rectangular block of cells an argument refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RangeSource {
    pub sheet: Option<String>,
    pub range: CellRange,
}

/// Range an argument denotes, if it is a range reference or a multi-cell name
pub(crate) fn range_source(
    graph: &Graph,
    node: &FormulaExpr,
    sheet: Option<&str>,
) -> Option<RangeSource> {
    match node {
        FormulaExpr::RangeRef(range) => Some(RangeSource {
            sheet: sheet.map(str::to_string),
            range: *range,
        }),
        FormulaExpr::Sheet { sheet, reference } => {
            range_source(graph, reference, Some(sheet.as_str()))
        }
        FormulaExpr::Paren(inner) => range_source(graph, inner, sheet),
        FormulaExpr::NameRef(name) => {
            let vertex = graph.vertex(graph.find_name(name)?);
            vertex.range().map(|range| RangeSource {
                sheet: vertex.sheet().map(str::to_string),
                range,
            })
        }
        _ => None,
    }
}
