//! Code generation error types

use thiserror::Error;

/// Result type for code generation
pub type CodegenResult<T> = std::result::Result<T, CodegenError>;

/// Errors raised while assembling or printing a program
///
/// Problems inside a single formula never show up here; they become placeholder
/// expressions and warnings.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The graph has no class assignments yet
    #[error("Graph must be partitioned before code generation")]
    NotPartitioned,

    /// A partitioned vertex is missing its variable name
    #[error("Vertex {0} has no variable name")]
    Unnamed(String),

    /// Writing output failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}
