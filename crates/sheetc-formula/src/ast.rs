//! Formula Abstract Syntax Tree types

use sheetc_core::{CellAddress, CellError, CellRange};

/// Formula expression AST
///
/// Sheet qualification is structural: `Sheet2!A1:A8` parses to a [`FormulaExpr::Sheet`]
/// node whose `reference` subtree holds the unqualified range. Every reference leaf
/// beneath a `Sheet` node belongs to that sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// Error literal
    Error(CellError),
    /// Omitted function argument (`IF(A1,,2)`)
    Missing,

    // === References ===
    /// Single cell reference
    CellRef(CellAddress),
    /// Rectangular range reference (`A1:B3`)
    RangeRef(CellRange),
    /// Named range or defined name
    NameRef(String),
    /// Sheet-qualified reference subtree
    Sheet {
        sheet: String,
        reference: Box<FormulaExpr>,
    },

    // === Operators ===
    /// Parenthesized sub-formula
    Paren(Box<FormulaExpr>),
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },

    // === Array ===
    Array(Vec<Vec<FormulaExpr>>),
}

impl FormulaExpr {
    /// Direct children of this node, left to right
    pub fn children(&self) -> Vec<&FormulaExpr> {
        match self {
            FormulaExpr::Sheet { reference, .. } => vec![reference.as_ref()],
            FormulaExpr::Paren(inner) => vec![inner.as_ref()],
            FormulaExpr::BinaryOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            FormulaExpr::UnaryOp { operand, .. } => vec![operand.as_ref()],
            FormulaExpr::Function { args, .. } => args.iter().collect(),
            FormulaExpr::Array(rows) => rows.iter().flatten().collect(),
            _ => Vec::new(),
        }
    }

    /// Strip any number of enclosing parentheses
    pub fn unparenthesized(&self) -> &FormulaExpr {
        let mut expr = self;
        while let FormulaExpr::Paren(inner) = expr {
            expr = inner;
        }
        expr
    }

    /// Whether this node is a reference (possibly sheet-qualified or parenthesized)
    pub fn is_reference(&self) -> bool {
        match self.unparenthesized() {
            FormulaExpr::CellRef(_) | FormulaExpr::RangeRef(_) | FormulaExpr::NameRef(_) => true,
            FormulaExpr::Sheet { reference, .. } => reference.is_reference(),
            _ => false,
        }
    }

    /// Short label of the node kind for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            FormulaExpr::Number(_) => "number",
            FormulaExpr::String(_) => "string",
            FormulaExpr::Boolean(_) => "boolean",
            FormulaExpr::Error(_) => "error",
            FormulaExpr::Missing => "omitted argument",
            FormulaExpr::CellRef(_) => "cell reference",
            FormulaExpr::RangeRef(_) => "range reference",
            FormulaExpr::NameRef(_) => "name",
            FormulaExpr::Sheet { .. } => "sheet reference",
            FormulaExpr::Paren(_) => "parentheses",
            FormulaExpr::BinaryOp { .. } => "binary operator",
            FormulaExpr::UnaryOp { .. } => "unary operator",
            FormulaExpr::Function { .. } => "function call",
            FormulaExpr::Array(_) => "array constant",
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,

    // Range
    Range,
}

impl BinaryOperator {
    /// Operator token as written in a formula
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Concat => "&",
            BinaryOperator::Range => ":",
        }
    }

    /// Whether the operator compares its operands
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Percent,
}
