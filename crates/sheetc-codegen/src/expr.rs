//! Target-neutral expression tree
//!
//! The translator produces [`Expr`] values; an emitter prints them. Nodes that
//! call into the generated-code support library name the helper by its path
//! inside that library (`sum`, `Date::from_ymd`), leaving the import prefix to
//! the emitter.

use std::fmt;

use sheetc_core::{CellError, CellType};

/// Static type of a generated value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Number,
    Date,
    Text,
    /// Tagged union resolved at run time
    Dynamic,
}

impl ValueType {
    /// Map an inferred type; unknown becomes [`ValueType::Dynamic`]
    pub fn from_cell_type(ty: Option<CellType>) -> Self {
        match ty {
            Some(CellType::Bool) => ValueType::Bool,
            Some(CellType::Number) => ValueType::Number,
            Some(CellType::Date) => ValueType::Date,
            Some(CellType::Text) => ValueType::Text,
            Some(CellType::Unknown) | None => ValueType::Dynamic,
        }
    }

    /// Inverse of [`ValueType::from_cell_type`]
    pub fn cell_type(self) -> Option<CellType> {
        match self {
            ValueType::Bool => Some(CellType::Bool),
            ValueType::Number => Some(CellType::Number),
            ValueType::Date => Some(CellType::Date),
            ValueType::Text => Some(CellType::Text),
            ValueType::Dynamic => None,
        }
    }

    /// Whether values of this type can be used by copy
    pub fn is_copy(self) -> bool {
        matches!(self, ValueType::Bool | ValueType::Number | ValueType::Date)
    }

    /// Usable as a number without going through the runtime
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Bool | ValueType::Number)
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Number => "number",
            ValueType::Date => "date",
            ValueType::Text => "text",
            ValueType::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Native binary operators of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    pub fn is_comparison(self) -> bool {
        !matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// A generated expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    /// Error value, always dynamic
    Error(CellError),
    /// Blank cell
    Empty,
    /// Named constant of the target language, e.g. pi
    Constant { path: &'static str, ty: ValueType },
    /// Variable of the unit being generated
    Ident { name: String, ty: ValueType },
    /// Variable of another unit, read through that unit's parameter
    Member {
        owner: String,
        field: String,
        ty: ValueType,
    },
    /// Parentheses written in the formula
    Group(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        /// Wrap compound operands in parentheses
        parenthesize: bool,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Call of a support-library function
    Call {
        function: &'static str,
        args: Vec<Expr>,
        ty: ValueType,
    },
    Method {
        receiver: Box<Expr>,
        method: &'static str,
        args: Vec<Expr>,
        ty: ValueType,
    },
    /// Borrowed list of dynamic values
    List(Vec<Expr>),
    /// Borrowed row-major matrix of dynamic values
    Matrix(Vec<Vec<Expr>>),
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        ty: ValueType,
    },
    Cast { expr: Box<Expr>, to: ValueType },
    /// Stand-in for something that could not be translated
    Placeholder { comment: String },
}

impl Expr {
    pub fn ty(&self) -> ValueType {
        match self {
            Expr::Number(_) => ValueType::Number,
            Expr::Text(_) => ValueType::Text,
            Expr::Bool(_) => ValueType::Bool,
            Expr::Error(_) | Expr::Empty | Expr::Placeholder { .. } => ValueType::Dynamic,
            Expr::List(_) | Expr::Matrix(_) => ValueType::Dynamic,
            Expr::Constant { ty, .. }
            | Expr::Ident { ty, .. }
            | Expr::Member { ty, .. }
            | Expr::Call { ty, .. }
            | Expr::Method { ty, .. }
            | Expr::If { ty, .. } => *ty,
            Expr::Group(inner) => inner.ty(),
            Expr::Binary { op, .. } if op.is_comparison() => ValueType::Bool,
            Expr::Binary { .. } => ValueType::Number,
            Expr::Unary { op: UnaryOp::Neg, .. } => ValueType::Number,
            Expr::Unary { op: UnaryOp::Not, .. } => ValueType::Bool,
            Expr::Cast { to, .. } => *to,
        }
    }

    /// Convert to `to`, wrapping in a cast only when the type differs
    pub fn cast(self, to: ValueType) -> Expr {
        if self.ty() == to {
            self
        } else {
            Expr::Cast {
                expr: Box::new(self),
                to,
            }
        }
    }

    pub fn call(function: &'static str, args: Vec<Expr>, ty: ValueType) -> Expr {
        Expr::Call { function, args, ty }
    }

    pub fn method(receiver: Expr, method: &'static str, args: Vec<Expr>, ty: ValueType) -> Expr {
        Expr::Method {
            receiver: Box::new(receiver),
            method,
            args,
            ty,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Expr::Placeholder { .. })
    }

    /// Whether any node in the tree is a placeholder
    pub fn contains_placeholder(&self) -> bool {
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Expr::Placeholder { .. } => return true,
                Expr::Group(inner) => stack.push(inner),
                Expr::Binary { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                Expr::Unary { operand, .. } => stack.push(operand),
                Expr::Call { args, .. } | Expr::List(args) => stack.extend(args),
                Expr::Method { receiver, args, .. } => {
                    stack.push(receiver);
                    stack.extend(args);
                }
                Expr::Matrix(rows) => stack.extend(rows.iter().flatten()),
                Expr::If {
                    condition,
                    then_branch,
                    else_branch,
                    ..
                } => {
                    stack.push(condition);
                    stack.push(then_branch);
                    stack.push(else_branch);
                }
                Expr::Cast { expr, .. } => stack.push(expr),
                _ => {}
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types() {
        let sum = Expr::Binary {
            op: BinaryOp::Add,
            left: Box::new(Expr::Number(1.0)),
            right: Box::new(Expr::Number(2.0)),
            parenthesize: false,
        };
        assert_eq!(sum.ty(), ValueType::Number);
        assert_eq!(Expr::Group(Box::new(Expr::Bool(true))).ty(), ValueType::Bool);
        assert_eq!(Expr::Empty.ty(), ValueType::Dynamic);
    }

    #[test]
    fn test_cast_only_when_needed() {
        assert_eq!(Expr::Number(1.0).cast(ValueType::Number), Expr::Number(1.0));
        let cast = Expr::Bool(true).cast(ValueType::Dynamic);
        assert!(matches!(cast, Expr::Cast { to: ValueType::Dynamic, .. }));
    }

    #[test]
    fn test_contains_placeholder() {
        let nested = Expr::call(
            "sum",
            vec![Expr::List(vec![Expr::Placeholder {
                comment: "x".into(),
            }])],
            ValueType::Number,
        );
        assert!(nested.contains_placeholder());
        assert!(!Expr::Number(1.0).contains_placeholder());
    }

    #[test]
    fn test_value_type_round_trip() {
        for ty in [
            ValueType::Bool,
            ValueType::Number,
            ValueType::Date,
            ValueType::Text,
            ValueType::Dynamic,
        ] {
            assert_eq!(ValueType::from_cell_type(ty.cell_type()), ty);
        }
    }
}
