//! Formula translation
//!
//! Turns a parsed formula into an [`Expr`] in the context of the vertex that owns
//! it. A reference to a vertex of the same class becomes a bare identifier; one
//! into another class becomes a member access through that class's parameter,
//! and the class is recorded so the unit can ask for it.
//!
//! Nothing here fails. Constructs without a translation (unknown functions,
//! wrong argument counts, array constants, nesting past [`MAX_DEPTH`]) become
//! [`Expr::Placeholder`] and are reported in [`Translation::issues`].

use std::collections::BTreeSet;

use sheetc_core::{CellAddress, CellType};
use sheetc_formula::{BinaryOperator, FormulaExpr, FunctionRegistry, UnaryOperator};
use sheetc_graph::{ClassId, Graph, Partition, VertexId, VertexKind};

use crate::expr::{BinaryOp, Expr, UnaryOp, ValueType};
use crate::program::instance_name;
use crate::types::{
    additive_type, infer_type, numeric_literal, range_source, resolve_cell, InferContext,
    RangeSource, TypeTable, MAX_DEPTH,
};

/// Formula operator, target operator, and whether compound operands are wrapped
const OPERATORS: &[(BinaryOperator, BinaryOp, bool)] = &[
    (BinaryOperator::Add, BinaryOp::Add, false),
    (BinaryOperator::Subtract, BinaryOp::Sub, true),
    (BinaryOperator::Multiply, BinaryOp::Mul, true),
    (BinaryOperator::Divide, BinaryOp::Div, true),
    (BinaryOperator::Equal, BinaryOp::Eq, true),
    (BinaryOperator::NotEqual, BinaryOp::Ne, true),
    (BinaryOperator::LessThan, BinaryOp::Lt, true),
    (BinaryOperator::LessEqual, BinaryOp::Le, true),
    (BinaryOperator::GreaterThan, BinaryOp::Gt, true),
    (BinaryOperator::GreaterEqual, BinaryOp::Ge, true),
];

fn native(op: BinaryOperator, left: Expr, right: Expr) -> Option<Expr> {
    OPERATORS
        .iter()
        .find(|(from, _, _)| *from == op)
        .map(|&(_, target, parenthesize)| Expr::Binary {
            op: target,
            left: Box::new(left),
            right: Box::new(right),
            parenthesize,
        })
}

/// Outcome of translating one formula
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub expr: Expr,
    /// One entry per placeholder or lossy fallback
    pub issues: Vec<String>,
    /// Other classes the expression reads from
    pub params: BTreeSet<ClassId>,
}

impl Translation {
    pub fn ty(&self) -> ValueType {
        self.expr.ty()
    }
}

/// Translates formulas of a partitioned graph
pub struct Translator<'a> {
    graph: &'a Graph,
    partition: &'a Partition,
    types: &'a TypeTable,
    functions: &'a FunctionRegistry,
}

impl<'a> Translator<'a> {
    pub fn new(graph: &'a Graph, partition: &'a Partition, types: &'a TypeTable) -> Self {
        Self {
            graph,
            partition,
            types,
            functions: FunctionRegistry::builtins(),
        }
    }

    /// Use a custom function registry
    pub fn with_functions(mut self, functions: &'a FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    /// Translate the formula of vertex `id`
    pub fn translate(&self, id: VertexId) -> Translation {
        let vertex = self.graph.vertex(id);
        match vertex.ast() {
            Some(ast) => self.translate_node(ast, id),
            None => {
                let comment = format!("{} has no parsed formula", vertex.label());
                Translation {
                    expr: Expr::Placeholder {
                        comment: comment.clone(),
                    },
                    issues: vec![comment],
                    params: BTreeSet::new(),
                }
            }
        }
    }

    /// Translate `node` as if it were the formula of `context`
    pub fn translate_node(&self, node: &FormulaExpr, context: VertexId) -> Translation {
        let mut session = Session {
            translator: self,
            class: self.graph.vertex(context).class(),
            issues: Vec::new(),
            params: BTreeSet::new(),
        };
        let expr = session.expr(node, None, 0);
        Translation {
            expr,
            issues: session.issues,
            params: session.params,
        }
    }

    /// Inferred result type of `node`
    pub fn infer(&self, node: &FormulaExpr) -> Option<CellType> {
        infer_type(
            node,
            &InferContext::new(self.graph, self.types, self.functions),
        )
    }
}

/// Per-formula translation state
struct Session<'t, 'a> {
    translator: &'t Translator<'a>,
    class: Option<ClassId>,
    issues: Vec<String>,
    params: BTreeSet<ClassId>,
}

impl Session<'_, '_> {
    fn placeholder(&mut self, comment: impl Into<String>) -> Expr {
        let comment = comment.into();
        self.issues.push(comment.clone());
        Expr::Placeholder { comment }
    }

    fn expr(&mut self, node: &FormulaExpr, sheet: Option<&str>, depth: usize) -> Expr {
        if depth > MAX_DEPTH {
            return self.placeholder(format!("Formula nested deeper than {MAX_DEPTH} levels"));
        }
        let depth = depth + 1;
        match node {
            FormulaExpr::Number(n) => Expr::Number(*n),
            FormulaExpr::String(s) => Expr::Text(s.clone()),
            FormulaExpr::Boolean(b) => Expr::Bool(*b),
            FormulaExpr::Error(e) => Expr::Error(*e),
            FormulaExpr::Missing => Expr::Empty,
            FormulaExpr::CellRef(address) => self.cell(sheet, *address, false),
            FormulaExpr::NameRef(name) => self.name(name),
            FormulaExpr::RangeRef(range) => {
                self.placeholder(format!("Range {range} used as a single value"))
            }
            FormulaExpr::Sheet { sheet, reference } => {
                self.expr(reference, Some(sheet.as_str()), depth)
            }
            FormulaExpr::Paren(inner) => match self.expr(inner, sheet, depth) {
                e @ (Expr::Binary { .. } | Expr::Unary { .. }) => Expr::Group(Box::new(e)),
                e => e,
            },
            FormulaExpr::UnaryOp { op, operand } => self.unary(*op, operand, sheet, depth),
            FormulaExpr::BinaryOp { op, left, right } => {
                self.binary(*op, left, right, sheet, depth)
            }
            FormulaExpr::Function { name, args } => self.function(name, args, sheet, depth),
            FormulaExpr::Array(_) => self.placeholder("Array constants are not supported"),
        }
    }

    /// Expression in numeric position; numeric text literals become numbers
    fn operand(&mut self, node: &FormulaExpr, sheet: Option<&str>, depth: usize) -> Expr {
        if let FormulaExpr::Missing = node {
            return Expr::Number(0.0);
        }
        match numeric_literal(node) {
            Some(n) => Expr::Number(n),
            None => self.expr(node, sheet, depth),
        }
    }

    fn number(&mut self, node: &FormulaExpr, sheet: Option<&str>, depth: usize) -> Expr {
        self.operand(node, sheet, depth).cast(ValueType::Number)
    }

    fn boolean(&mut self, node: &FormulaExpr, sheet: Option<&str>, depth: usize) -> Expr {
        match node {
            FormulaExpr::Missing => Expr::Bool(false),
            node => self.expr(node, sheet, depth).cast(ValueType::Bool),
        }
    }

    fn text(&mut self, node: &FormulaExpr, sheet: Option<&str>, depth: usize) -> Expr {
        match node {
            FormulaExpr::Missing => Expr::Text(String::new()),
            node => self.expr(node, sheet, depth).cast(ValueType::Text),
        }
    }

    fn dynamic(&mut self, node: &FormulaExpr, sheet: Option<&str>, depth: usize) -> Expr {
        self.expr(node, sheet, depth).cast(ValueType::Dynamic)
    }

    // === References ===

    fn cell(&mut self, sheet: Option<&str>, address: CellAddress, in_range: bool) -> Expr {
        match resolve_cell(self.translator.graph, sheet, address) {
            Some(id) => self.reference(id),
            None if in_range => Expr::Empty,
            None => {
                let label = match sheet {
                    Some(sheet) => format!("{sheet}!{}", address.to_relative_string()),
                    None => address.to_relative_string(),
                };
                self.issues
                    .push(format!("Reference to missing cell {label} treated as blank"));
                Expr::Empty
            }
        }
    }

    fn reference(&mut self, id: VertexId) -> Expr {
        let translator = self.translator;
        let vertex = translator.graph.vertex(id);
        let ty = translator.types.get(id);
        let (Some(class), Some(name)) = (vertex.class(), vertex.variable_name()) else {
            return self.placeholder(format!("{} is not part of any class", vertex.label()));
        };
        if Some(class) == self.class {
            return Expr::Ident {
                name: name.to_string(),
                ty,
            };
        }
        match translator.partition.get(class) {
            Some(owner) => {
                self.params.insert(class);
                Expr::Member {
                    owner: instance_name(&owner.name),
                    field: name.to_string(),
                    ty,
                }
            }
            None => self.placeholder(format!("{} belongs to an unknown class", vertex.label())),
        }
    }

    fn name(&mut self, name: &str) -> Expr {
        let graph = self.translator.graph;
        match graph.find_name(name) {
            Some(id) if graph.vertex(id).kind() == VertexKind::Cell => self.reference(id),
            Some(_) => self.placeholder(format!("Named range {name} used as a single value")),
            None => self.placeholder(format!("Unknown name {name}")),
        }
    }

    /// Every cell of a range, row by row, blanks included
    fn range_cells(&mut self, source: &RangeSource) -> Vec<Vec<Expr>> {
        let sheet = source.sheet.as_deref();
        let mut rows = Vec::new();
        for row in source.range.rows() {
            let mut cells = Vec::with_capacity(row.len());
            for address in row {
                cells.push(self.cell(sheet, address, true).cast(ValueType::Dynamic));
            }
            rows.push(cells);
        }
        rows
    }

    /// Arguments flattened to one list, ranges expanded in reading order
    fn values(&mut self, args: &[FormulaExpr], sheet: Option<&str>, depth: usize) -> Vec<Expr> {
        let mut values = Vec::new();
        for arg in args {
            match range_source(self.translator.graph, arg, sheet) {
                Some(source) => values.extend(self.range_cells(&source).into_iter().flatten()),
                None => values.push(self.dynamic(arg, sheet, depth)),
            }
        }
        values
    }

    // === Operators ===

    fn unary(
        &mut self,
        op: UnaryOperator,
        operand: &FormulaExpr,
        sheet: Option<&str>,
        depth: usize,
    ) -> Expr {
        match op {
            UnaryOperator::Negate => Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.number(operand, sheet, depth)),
            },
            UnaryOperator::Percent => match operand.unparenthesized() {
                FormulaExpr::Number(n) => Expr::Number(n / 100.0),
                _ => {
                    let value = self.number(operand, sheet, depth);
                    native(BinaryOperator::Divide, value, Expr::Number(100.0))
                        .unwrap_or_else(|| self.placeholder("Percent could not be translated"))
                }
            },
        }
    }

    fn binary(
        &mut self,
        op: BinaryOperator,
        left: &FormulaExpr,
        right: &FormulaExpr,
        sheet: Option<&str>,
        depth: usize,
    ) -> Expr {
        match op {
            BinaryOperator::Concat => self.concat(left, right, sheet, depth),
            BinaryOperator::Range => {
                self.placeholder("Range operator with computed bounds is not supported")
            }
            BinaryOperator::Power => {
                let base = self.number(left, sheet, depth);
                let exponent = self.number(right, sheet, depth);
                Expr::method(base, "powf", vec![exponent], ValueType::Number)
            }
            BinaryOperator::Add | BinaryOperator::Subtract => {
                self.additive(op, left, right, sheet, depth)
            }
            BinaryOperator::Multiply | BinaryOperator::Divide => {
                let l = self.number(left, sheet, depth);
                let r = self.number(right, sheet, depth);
                native(op, l, r).unwrap_or_else(|| self.placeholder("Unknown operator"))
            }
            _ => self.comparison(op, left, right, sheet, depth),
        }
    }

    /// `+` and `-`, with date arithmetic when a date is involved
    fn additive(
        &mut self,
        op: BinaryOperator,
        left: &FormulaExpr,
        right: &FormulaExpr,
        sheet: Option<&str>,
        depth: usize,
    ) -> Expr {
        let l = self.operand(left, sheet, depth);
        let r = self.operand(right, sheet, depth);
        let (lt, rt) = (l.ty(), r.ty());
        let add = op == BinaryOperator::Add;

        match additive_type(op, lt.cell_type(), rt.cell_type()) {
            Some(CellType::Date) if add && lt == ValueType::Date => Expr::call(
                "date_add",
                vec![l, r.cast(ValueType::Number)],
                ValueType::Date,
            ),
            Some(CellType::Date) if add => Expr::call(
                "date_add",
                vec![r, l.cast(ValueType::Number)],
                ValueType::Date,
            ),
            Some(CellType::Date) => Expr::call(
                "date_sub",
                vec![l, r.cast(ValueType::Number)],
                ValueType::Date,
            ),
            Some(CellType::Number) if lt == ValueType::Date => {
                Expr::call("date_diff", vec![l, r], ValueType::Number)
            }
            Some(CellType::Number) => {
                native(op, l.cast(ValueType::Number), r.cast(ValueType::Number))
                    .unwrap_or_else(|| self.placeholder("Unknown operator"))
            }
            _ => Expr::call(
                if add { "add" } else { "sub" },
                vec![l, r],
                ValueType::Dynamic,
            ),
        }
    }

    fn comparison(
        &mut self,
        op: BinaryOperator,
        left: &FormulaExpr,
        right: &FormulaExpr,
        sheet: Option<&str>,
        depth: usize,
    ) -> Expr {
        let l = self.expr(left, sheet, depth);
        let r = self.expr(right, sheet, depth);
        let (lt, rt) = (l.ty(), r.ty());

        if lt == ValueType::Text && rt == ValueType::Text {
            let equal = || Expr::call("text_eq", vec![l.clone(), r.clone()], ValueType::Bool);
            match op {
                BinaryOperator::Equal => return equal(),
                BinaryOperator::NotEqual => {
                    return Expr::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(equal()),
                    }
                }
                _ => {}
            }
        }

        if lt == rt && lt.is_copy() {
            if let Some(expr) = native(op, l.clone(), r.clone()) {
                return expr;
            }
        }

        let method = match op {
            BinaryOperator::Equal => "is_eq",
            BinaryOperator::NotEqual => "is_ne",
            BinaryOperator::LessThan => "is_lt",
            BinaryOperator::LessEqual => "is_le",
            BinaryOperator::GreaterThan => "is_gt",
            _ => "is_ge",
        };
        let ordering = Expr::call("compare", vec![l, r], ValueType::Dynamic);
        Expr::method(ordering, method, Vec::new(), ValueType::Bool)
    }

    /// A chain of `&` as one concatenation
    fn concat(
        &mut self,
        left: &FormulaExpr,
        right: &FormulaExpr,
        sheet: Option<&str>,
        depth: usize,
    ) -> Expr {
        let mut operands: Vec<&FormulaExpr> = vec![right];
        let mut current = left;
        while let FormulaExpr::BinaryOp {
            op: BinaryOperator::Concat,
            left,
            right,
        } = current
        {
            operands.push(right.as_ref());
            current = left.as_ref();
        }
        operands.push(current);
        operands.reverse();

        let parts = operands
            .into_iter()
            .map(|node| self.dynamic(node, sheet, depth))
            .collect();
        Expr::call("concat", vec![Expr::List(parts)], ValueType::Text)
    }

    // === Functions ===

    fn function(
        &mut self,
        name: &str,
        args: &[FormulaExpr],
        sheet: Option<&str>,
        depth: usize,
    ) -> Expr {
        let functions = self.translator.functions;
        let Some(def) = functions.get(name) else {
            return self.placeholder(format!("Unsupported function {name}"));
        };
        if !def.accepts(args.len()) {
            return self.placeholder(format!(
                "{} expects {} arguments, got {}",
                def.name,
                def.arity(),
                args.len()
            ));
        }

        use ValueType::{Bool, Date, Dynamic, Number, Text};
        match def.name {
            "SUM" | "AVERAGE" | "MIN" | "MAX" | "COUNT" | "COUNTA" | "PRODUCT" => {
                let helper = match def.name {
                    "SUM" => "sum",
                    "AVERAGE" => "average",
                    "MIN" => "min",
                    "MAX" => "max",
                    "COUNT" => "count",
                    "COUNTA" => "counta",
                    _ => "product",
                };
                let values = self.values(args, sheet, depth);
                Expr::call(helper, vec![Expr::List(values)], Number)
            }
            "ABS" | "SQRT" | "EXP" | "LN" | "LOG10" => {
                let method = match def.name {
                    "ABS" => "abs",
                    "SQRT" => "sqrt",
                    "EXP" => "exp",
                    "LN" => "ln",
                    _ => "log10",
                };
                let value = self.number(&args[0], sheet, depth);
                Expr::method(value, method, Vec::new(), Number)
            }
            "POWER" => {
                let base = self.number(&args[0], sheet, depth);
                let exponent = self.number(&args[1], sheet, depth);
                Expr::method(base, "powf", vec![exponent], Number)
            }
            "ROUND" | "ROUNDUP" | "ROUNDDOWN" | "MOD" => {
                let helper = match def.name {
                    "ROUND" => "round",
                    "ROUNDUP" => "roundup",
                    "ROUNDDOWN" => "rounddown",
                    _ => "modulo",
                };
                let value = self.number(&args[0], sheet, depth);
                let second = self.number(&args[1], sheet, depth);
                Expr::call(helper, vec![value, second], Number)
            }
            "INT" | "SIGN" => {
                let helper = if def.name == "INT" { "int" } else { "sign" };
                let value = self.number(&args[0], sheet, depth);
                Expr::call(helper, vec![value], Number)
            }
            "PI" => Expr::Constant {
                path: "std::f64::consts::PI",
                ty: Number,
            },
            "IF" => self.conditional(args, sheet, depth),
            "AND" | "OR" => {
                let helper = if def.name == "AND" { "and" } else { "or" };
                let values = self.values(args, sheet, depth);
                Expr::call(helper, vec![Expr::List(values)], Bool)
            }
            "NOT" => Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.boolean(&args[0], sheet, depth)),
            },
            "TRUE" => Expr::Bool(true),
            "FALSE" => Expr::Bool(false),
            "IFERROR" => {
                let value = self.expr(&args[0], sheet, depth);
                let fallback = self.expr(&args[1], sheet, depth);
                Expr::call("if_error", vec![value, fallback], Dynamic)
            }
            "ISBLANK" | "ISNUMBER" | "ISTEXT" => {
                let helper = match def.name {
                    "ISBLANK" => "is_blank",
                    "ISNUMBER" => "is_number",
                    _ => "is_text",
                };
                let value = self.expr(&args[0], sheet, depth);
                Expr::call(helper, vec![value], Bool)
            }
            "CONCATENATE" => {
                let values = self.values(args, sheet, depth);
                Expr::call("concat", vec![Expr::List(values)], Text)
            }
            "LEFT" | "RIGHT" => {
                let helper = if def.name == "LEFT" { "left" } else { "right" };
                let text = self.text(&args[0], sheet, depth);
                let count = match args.get(1) {
                    Some(arg) => self.number(arg, sheet, depth),
                    None => Expr::Number(1.0),
                };
                Expr::call(helper, vec![text, count], Text)
            }
            "MID" => {
                let text = self.text(&args[0], sheet, depth);
                let start = self.number(&args[1], sheet, depth);
                let count = self.number(&args[2], sheet, depth);
                Expr::call("mid", vec![text, start, count], Text)
            }
            "LEN" => {
                let text = self.text(&args[0], sheet, depth);
                Expr::call("len", vec![text], Number)
            }
            "UPPER" | "LOWER" | "TRIM" => {
                let helper = match def.name {
                    "UPPER" => "upper",
                    "LOWER" => "lower",
                    _ => "trim",
                };
                let text = self.text(&args[0], sheet, depth);
                Expr::call(helper, vec![text], Text)
            }
            "EXACT" => {
                let a = self.text(&args[0], sheet, depth);
                let b = self.text(&args[1], sheet, depth);
                Expr::call("exact", vec![a, b], Bool)
            }
            "DATE" => {
                let year = self.number(&args[0], sheet, depth);
                let month = self.number(&args[1], sheet, depth);
                let day = self.number(&args[2], sheet, depth);
                Expr::call("Date::from_ymd", vec![year, month, day], Date)
            }
            "YEAR" | "MONTH" | "DAY" => {
                let method = match def.name {
                    "YEAR" => "year",
                    "MONTH" => "month",
                    _ => "day",
                };
                let date = self.expr(&args[0], sheet, depth).cast(Date);
                Expr::method(date, method, Vec::new(), Number)
            }
            "TODAY" => Expr::call("Date::today", Vec::new(), Date),
            "NOW" => Expr::call("Date::now", Vec::new(), Date),
            "VLOOKUP" | "HLOOKUP" => self.table_lookup(def.name, args, sheet, depth),
            "INDEX" => self.index(args, sheet, depth),
            "MATCH" => self.match_position(args, sheet, depth),
            "CHOOSE" => {
                let index = self.number(&args[0], sheet, depth);
                let options = args[1..]
                    .iter()
                    .map(|arg| self.dynamic(arg, sheet, depth))
                    .collect();
                Expr::call("choose", vec![index, Expr::List(options)], Dynamic)
            }
            other => self.placeholder(format!("No translation for {other}")),
        }
    }

    /// IF with both branches brought to a common type; an omitted branch yields 0
    fn conditional(&mut self, args: &[FormulaExpr], sheet: Option<&str>, depth: usize) -> Expr {
        let condition = self.boolean(&args[0], sheet, depth);
        let mut branch = |arg: &FormulaExpr| match arg {
            FormulaExpr::Missing => Expr::Number(0.0),
            arg => self.expr(arg, sheet, depth),
        };
        let then_branch = branch(&args[1]);
        let else_branch = match args.get(2) {
            Some(arg) => branch(arg),
            None => Expr::Bool(false),
        };
        let ty = if then_branch.ty() == else_branch.ty() {
            then_branch.ty()
        } else {
            ValueType::Dynamic
        };
        Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch.cast(ty)),
            else_branch: Box::new(else_branch.cast(ty)),
            ty,
        }
    }

    fn table_lookup(
        &mut self,
        function: &'static str,
        args: &[FormulaExpr],
        sheet: Option<&str>,
        depth: usize,
    ) -> Expr {
        let Some(source) = range_source(self.translator.graph, &args[1], sheet) else {
            return self.placeholder(format!("{function} needs a cell range as its table"));
        };
        let key = self.expr(&args[0], sheet, depth);
        let table = Expr::Matrix(self.range_cells(&source));
        let index = self.number(&args[2], sheet, depth);
        let approximate = match args.get(3) {
            Some(arg) => self.boolean(arg, sheet, depth),
            None => Expr::Bool(true),
        };
        let helper = if function == "VLOOKUP" {
            "vlookup"
        } else {
            "hlookup"
        };
        Expr::call(helper, vec![key, table, index, approximate], ValueType::Dynamic)
    }

    fn index(&mut self, args: &[FormulaExpr], sheet: Option<&str>, depth: usize) -> Expr {
        let Some(source) = range_source(self.translator.graph, &args[0], sheet) else {
            return self.placeholder("INDEX needs a cell range as its table");
        };
        let table = Expr::Matrix(self.range_cells(&source));
        let first = self.number(&args[1], sheet, depth);
        let (row, column) = match args.get(2) {
            Some(arg) => (first, self.number(arg, sheet, depth)),
            // A single row is indexed by column
            None if source.range.row_count() == 1 => (Expr::Number(1.0), first),
            None => (first, Expr::Number(1.0)),
        };
        Expr::call("index", vec![table, row, column], ValueType::Dynamic)
    }

    fn match_position(&mut self, args: &[FormulaExpr], sheet: Option<&str>, depth: usize) -> Expr {
        let Some(source) = range_source(self.translator.graph, &args[1], sheet) else {
            return self.placeholder("MATCH needs a cell range to search");
        };
        let key = self.expr(&args[0], sheet, depth);
        let values = Expr::List(self.range_cells(&source).into_iter().flatten().collect());
        let kind = match args.get(2) {
            Some(arg) => self.number(arg, sheet, depth),
            None => Expr::Number(1.0),
        };
        Expr::call("match_position", vec![key, values, kind], ValueType::Dynamic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::RustEmitter;
    use pretty_assertions::assert_eq;
    use sheetc_core::{CellValue, Worksheet};
    use sheetc_formula::parse_formula;
    use sheetc_graph::{ClassPartitioner, Diagnostics, GraphBuilder};

    struct Fixture {
        graph: Graph,
        partition: Partition,
        types: TypeTable,
    }

    impl Fixture {
        fn new(sheet: &Worksheet) -> Self {
            let mut diags = Diagnostics::new();
            let mut graph = GraphBuilder::new()
                .build(sheet, |_, _| None, &mut diags)
                .unwrap();
            let partition = ClassPartitioner::new()
                .partition(&mut graph, &mut diags)
                .unwrap();
            let types = TypeTable::build(&graph, &partition, FunctionRegistry::builtins());
            Self {
                graph,
                partition,
                types,
            }
        }

        fn translate(&self, a1: &str) -> Translation {
            let id = self
                .graph
                .find_cell(CellAddress::parse(a1).unwrap())
                .unwrap();
            Translator::new(&self.graph, &self.partition, &self.types).translate(id)
        }

        /// Rendered Rust for the formula in `a1`
        fn code(&self, a1: &str) -> String {
            RustEmitter::default().expression(&self.translate(a1).expr)
        }
    }

    fn with_inputs(inputs: &[(&str, CellValue)], formula: &str) -> Fixture {
        let mut sheet = Worksheet::new("Sheet1");
        for (address, value) in inputs {
            sheet.set_cell_value(address, value.clone()).unwrap();
        }
        sheet.set_cell_formula("Z1", formula).unwrap();
        Fixture::new(&sheet)
    }

    fn code(inputs: &[(&str, CellValue)], formula: &str) -> String {
        with_inputs(inputs, formula).code("Z1")
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_arithmetic() {
        let inputs = [("A1", num(5.0)), ("A2", num(2.0)), ("A3", num(3.0))];
        assert_eq!(code(&inputs, "=A1*2"), "a1 * 2.0");
        assert_eq!(code(&inputs, "=(A1+A2)*A3"), "(a1 + a2) * a3");
        assert_eq!(code(&inputs, "=A1-(A2-A3)"), "a1 - (a2 - a3)");
        assert_eq!(code(&inputs, "=A1+A2-A3"), "a1 + a2 - a3");
        assert_eq!(code(&inputs, "=A1^2"), "a1.powf(2.0)");
        assert_eq!(code(&inputs, "=2^A1"), "f64::powf(2.0, a1)");
        assert_eq!(code(&inputs, "=-A1"), "-a1");
    }

    #[test]
    fn test_text_equality_ignores_case() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_formula("A1", "=\"text1\"").unwrap();
        sheet.set_cell_formula("B1", "=\"text2\"").unwrap();
        sheet.set_cell_formula("C1", "=(A1=B1)").unwrap();
        let fixture = Fixture::new(&sheet);

        let translation = fixture.translate("C1");
        assert_eq!(translation.ty(), ValueType::Bool);
        assert!(translation.issues.is_empty());
        assert_eq!(fixture.code("C1"), "rt::text_eq(a1.clone(), b1.clone())");
    }

    #[test]
    fn test_comparisons() {
        let inputs = [("A1", num(5.0)), ("A2", text("x")), ("A3", text("X"))];
        assert_eq!(code(&inputs, "=A2<>A3"), "!rt::text_eq(a2.clone(), a3.clone())");
        assert_eq!(code(&inputs, "=A1>=3"), "a1 >= 3.0");
        assert_eq!(
            code(&inputs, "=A1<A2"),
            "rt::compare(a1, a2.clone()).is_lt()"
        );
        assert_eq!(
            code(&inputs, "=A2<A3"),
            "rt::compare(a2.clone(), a3.clone()).is_lt()"
        );
    }

    #[test]
    fn test_date_arithmetic() {
        let inputs = [
            ("A1", CellValue::Date(45306.0)),
            ("A2", num(7.0)),
            ("A3", CellValue::Date(45000.0)),
        ];
        let fixture = with_inputs(&inputs, "=A1+A2");
        assert_eq!(fixture.translate("Z1").ty(), ValueType::Date);
        assert_eq!(fixture.code("Z1"), "rt::date_add(a1, a2)");
        assert_eq!(code(&inputs, "=A2+A1"), "rt::date_add(a1, a2)");
        assert_eq!(code(&inputs, "=A1-A2"), "rt::date_sub(a1, a2)");

        let diff = with_inputs(&inputs, "=A1-A3");
        assert_eq!(diff.translate("Z1").ty(), ValueType::Number);
        assert_eq!(diff.code("Z1"), "rt::date_diff(a1, a3)");
    }

    #[test]
    fn test_mixed_additions() {
        let inputs = [("A1", CellValue::Boolean(true)), ("A2", text("3"))];
        assert_eq!(code(&inputs, "=A1+1"), "rt::num(a1) + 1.0");
        assert_eq!(code(&inputs, "=A2+1"), "rt::add(a2.clone(), 1.0)");
        assert_eq!(code(&inputs, "=\"nan\"+1"), "rt::add(String::from(\"nan\"), 1.0)");
    }

    #[test]
    fn test_math_on_literals_names_the_float_type() {
        let inputs = [("A1", num(1.0))];
        assert_eq!(code(&inputs, "=A1+ABS(-3)"), "a1 + f64::abs(-3.0)");
        assert_eq!(code(&inputs, "=EXP(1+1)*A1"), "f64::exp(1.0 + 1.0) * a1");
        assert_eq!(code(&inputs, "=(1+1)^2+A1"), "f64::powf(1.0 + 1.0, 2.0) + a1");
        assert_eq!(code(&inputs, "=(-2)^2+A1"), "f64::powf(-2.0, 2.0) + a1");
        assert_eq!(code(&inputs, "=LN(10*2)+A1"), "f64::ln(10.0 * 2.0) + a1");
        assert_eq!(code(&inputs, "=ABS(A1-3)"), "(a1 - 3.0).abs()");
    }

    #[test]
    fn test_percent_literals() {
        let inputs = [("A1", num(200.0))];
        assert_eq!(code(&inputs, "=A1*\"5%\""), "a1 * 0.05");
        assert_eq!(code(&inputs, "=A1*50%"), "a1 * 0.5");
        assert_eq!(code(&inputs, "=A1%"), "a1 / 100.0");
    }

    #[test]
    fn test_if_unifies_branch_types() {
        let inputs = [("A1", num(5.0)), ("A2", text("x"))];

        let mixed = with_inputs(&inputs, "=IF(A1>1,A1,A2)");
        assert_eq!(mixed.translate("Z1").ty(), ValueType::Dynamic);
        assert_eq!(
            mixed.code("Z1"),
            "if a1 > 1.0 { rt::Dynamic::from(a1) } else { rt::Dynamic::from(a2.clone()) }"
        );

        assert_eq!(
            code(&inputs, "=IF(A1>1,1,2)"),
            "if a1 > 1.0 { 1.0 } else { 2.0 }"
        );
        assert_eq!(
            code(&inputs, "=IF(A1>1,TRUE)"),
            "if a1 > 1.0 { true } else { false }"
        );
        assert_eq!(
            code(&inputs, "=IF(A1,1,2)"),
            "if rt::truthy(a1) { 1.0 } else { 2.0 }"
        );
    }

    #[test]
    fn test_omitted_arguments_take_defaults() {
        let inputs = [
            ("A1", num(1.0)),
            ("A2", num(2.0)),
            ("B1", text("a")),
            ("B2", text("b")),
        ];
        assert_eq!(
            code(&inputs, "=IF(A1>1,,2)"),
            "if a1 > 1.0 { 0.0 } else { 2.0 }"
        );
        assert_eq!(
            code(&inputs, "=IF(A1>1,2,)"),
            "if a1 > 1.0 { 2.0 } else { 0.0 }"
        );
        assert_eq!(
            code(&inputs, "=VLOOKUP(2,A1:B2,2,)"),
            "rt::vlookup(2.0, &[vec![rt::Dynamic::from(a1), rt::Dynamic::from(b1.clone())], \
             vec![rt::Dynamic::from(a2), rt::Dynamic::from(b2.clone())]], 2.0, false)"
        );
        assert_eq!(
            code(&inputs, "=MATCH(2,A1:A2,)"),
            "rt::match_position(2.0, &[rt::Dynamic::from(a1), rt::Dynamic::from(a2)], 0.0)"
        );
        assert_eq!(
            code(&inputs, "=CONCATENATE(B1,,B2)"),
            "rt::concat(&[rt::Dynamic::from(b1.clone()), rt::Dynamic::Empty, \
             rt::Dynamic::from(b2.clone())])"
        );
    }

    #[test]
    fn test_aggregates_expand_ranges() {
        let inputs = [("A1", num(1.0)), ("A3", num(3.0))];
        assert_eq!(
            code(&inputs, "=SUM(A1:A3)"),
            "rt::sum(&[rt::Dynamic::from(a1), rt::Dynamic::Empty, rt::Dynamic::from(a3)])"
        );
        assert_eq!(
            code(&inputs, "=MAX(A1,10)"),
            "rt::max(&[rt::Dynamic::from(a1), rt::Dynamic::from(10.0)])"
        );
    }

    #[test]
    fn test_lookup_uses_matrix() {
        let inputs = [
            ("A1", num(1.0)),
            ("A2", num(2.0)),
            ("B1", text("a")),
            ("B2", text("b")),
        ];
        assert_eq!(
            code(&inputs, "=VLOOKUP(2,A1:B2,2,FALSE)"),
            "rt::vlookup(2.0, &[vec![rt::Dynamic::from(a1), rt::Dynamic::from(b1.clone())], \
             vec![rt::Dynamic::from(a2), rt::Dynamic::from(b2.clone())]], 2.0, false)"
        );
        assert_eq!(
            code(&inputs, "=MATCH(2,A1:A2,0)"),
            "rt::match_position(2.0, &[rt::Dynamic::from(a1), rt::Dynamic::from(a2)], 0.0)"
        );
        assert_eq!(
            code(&inputs, "=INDEX(A1:B1,2)"),
            "rt::index(&[vec![rt::Dynamic::from(a1), rt::Dynamic::from(b1.clone())]], 1.0, 2.0)"
        );
    }

    #[test]
    fn test_wrong_arity_is_a_placeholder() {
        let inputs = [("A1", num(1.0)), ("A2", num(2.0))];
        let fixture = with_inputs(&inputs, "=VLOOKUP(A1,A1:A2)");
        let translation = fixture.translate("Z1");

        assert!(translation.expr.is_placeholder());
        assert_eq!(
            translation.issues,
            vec!["VLOOKUP expects 3..=4 arguments, got 2".to_string()]
        );
        assert_eq!(
            fixture.code("Z1"),
            "/* VLOOKUP expects 3..=4 arguments, got 2 */ rt::Dynamic::Error(rt::CellError::Name)"
        );
    }

    #[test]
    fn test_unknown_function_is_a_placeholder() {
        let fixture = with_inputs(&[("A1", num(1.0))], "=MYFUNC(A1)+1");
        let translation = fixture.translate("Z1");
        assert_eq!(translation.issues, vec!["Unsupported function MYFUNC".to_string()]);
        assert!(translation.expr.contains_placeholder());
    }

    #[test]
    fn test_concat_chain() {
        let inputs = [("A1", text("a"))];
        assert_eq!(
            code(&inputs, "=A1&\"-\"&2"),
            "rt::concat(&[rt::Dynamic::from(a1.clone()), \
             rt::Dynamic::from(\"-\"), rt::Dynamic::from(2.0)])"
        );
    }

    #[test]
    fn test_cross_class_reference_is_qualified() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", 10.0).unwrap();
        sheet.set_cell_formula("B1", "=A1+1").unwrap();
        sheet.set_cell_formula("C1", "=A1+2").unwrap();
        let fixture = Fixture::new(&sheet);

        let translation = fixture.translate("B1");
        assert_eq!(fixture.code("B1"), "global.a1 + 1.0");
        let global = fixture.partition.global().unwrap().id;
        assert_eq!(translation.params.into_iter().collect::<Vec<_>>(), vec![global]);
    }

    #[test]
    fn test_nesting_limit() {
        let fixture = with_inputs(&[("A1", num(1.0))], "=A1");
        let mut node = FormulaExpr::Number(1.0);
        for _ in 0..(MAX_DEPTH + 5) {
            node = FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(node),
            };
        }
        let z1 = fixture
            .graph
            .find_cell(CellAddress::parse("Z1").unwrap())
            .unwrap();
        let translator = Translator::new(&fixture.graph, &fixture.partition, &fixture.types);
        let translation = translator.translate_node(&node, z1);
        assert!(translation.expr.contains_placeholder());
        assert_eq!(
            translation.issues,
            vec![format!("Formula nested deeper than {MAX_DEPTH} levels")]
        );
    }

    #[test]
    fn test_translation_type_matches_inference() {
        let inputs = [
            ("A1", num(5.0)),
            ("A2", text("x")),
            ("A3", CellValue::Date(45306.0)),
            ("A4", CellValue::Boolean(true)),
        ];
        let formulas = [
            "=A1*2",
            "=A2&A1",
            "=A3+A1",
            "=A3-A3",
            "=A2+A1",
            "=IF(A4,A1,A2)",
            "=IF(A4,A3,A3+1)",
            "=IF(A4,,A1)",
            "=IF(A4,A2,)",
            "=LEN(A2)",
            "=UPPER(A2)",
            "=TODAY()",
            "=VLOOKUP(1,A1:A2,1)",
            "=NOT(A4)",
            "=A2=A2",
        ];
        for formula in formulas {
            let fixture = with_inputs(&inputs, formula);
            let z1 = fixture
                .graph
                .find_cell(CellAddress::parse("Z1").unwrap())
                .unwrap();
            let translator =
                Translator::new(&fixture.graph, &fixture.partition, &fixture.types);
            let ast = parse_formula(formula).unwrap();
            assert_eq!(
                translator.translate(z1).ty(),
                ValueType::from_cell_type(translator.infer(&ast)),
                "{formula}"
            );
        }
    }
}
