//! # sheetc-formula
//!
//! Formula front end for sheetc.
//!
//! This crate provides:
//! - Formula parsing (text → AST), with sheet qualification kept as a tree node
//! - Locale normalization applied before parsing
//! - The registry of built-in functions code generation understands
//!
//! ## Example
//!
//! ```rust
//! use sheetc_formula::{parse_formula, FormulaExpr};
//!
//! let ast = parse_formula("=SUM(A1:A10)").unwrap();
//! assert!(matches!(ast, FormulaExpr::Function { .. }));
//! ```

pub mod ast;
pub mod error;
pub mod functions;
pub mod locale;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use error::{FormulaError, FormulaResult};
pub use functions::{FunctionCategory, FunctionDef, FunctionRegistry};
pub use locale::normalize_locale;
pub use parser::{parse_formula, MAX_NESTING};
