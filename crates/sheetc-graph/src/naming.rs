//! Identifier allocation
//!
//! Class names and variable names share one namespace, so a cell can never be
//! named after a class or another cell. Comparison is case-insensitive.

use ahash::AHashSet;

use crate::vertex::{Location, Vertex};

const RESERVED: &[&str] = &[
    // Rust keywords
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "try", "typeof", "union", "unsized", "virtual", "yield",
    // Names used by generated code
    "new", "calculate", "rt", "model", "global", "external",
];

/// Hands out unique identifiers
#[derive(Debug, Clone)]
pub struct Namer {
    taken: AHashSet<String>,
}

impl Namer {
    pub fn new() -> Self {
        Self {
            taken: RESERVED.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Claim `base` verbatim if free, else the first free `base_2`, `base_3`, ...
    pub fn claim(&mut self, base: &str) -> String {
        let base = sanitize_identifier(base);
        if self.taken.insert(base.to_lowercase()) {
            return base;
        }
        (2..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| self.taken.insert(candidate.to_lowercase()))
            .unwrap_or(base)
    }

    /// Whether an identifier is already in use
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(&name.to_lowercase())
    }
}

impl Default for Namer {
    fn default() -> Self {
        Self::new()
    }
}

/// Class name for an output field, e.g. `ClassB1`
pub fn class_name(vertex: &Vertex) -> String {
    format!("Class{}", vertex.label())
}

/// Lowercase base name for a vertex's variable
///
/// `b1` for a local cell, `sheet2_a3` for an external one, and the defined name
/// (or `range_a1_b3`) for a range.
pub fn variable_base(vertex: &Vertex) -> String {
    let local = match vertex.key().location {
        Location::Cell(address) => address.to_relative_string(),
        Location::Range(range) => match vertex.name() {
            Some(name) => return sanitize_identifier(name).to_lowercase(),
            None => format!(
                "range_{}_{}",
                range.start.to_relative_string(),
                range.end.to_relative_string()
            ),
        },
    };
    let raw = match vertex.sheet() {
        Some(sheet) => format!("{sheet}_{local}"),
        None => local,
    };
    sanitize_identifier(&raw).to_lowercase()
}

/// Squash arbitrary text into a valid identifier
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    match trimmed.chars().next() {
        None => "value".to_string(),
        Some(c) if c.is_ascii_digit() => format!("v_{trimmed}"),
        Some(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_identifier("Q1 Data_B2"), "Q1_Data_B2");
        assert_eq!(sanitize_identifier("2024 rates"), "v_2024_rates");
        assert_eq!(sanitize_identifier("$$"), "value");
        assert_eq!(sanitize_identifier("a--b"), "a_b");
    }

    #[test]
    fn test_claims_are_unique_across_case() {
        let mut namer = Namer::new();
        assert_eq!(namer.claim("ClassB1"), "ClassB1");
        assert_eq!(namer.claim("classb1"), "classb1_2");
        assert_eq!(namer.claim("b1"), "b1");
        assert_eq!(namer.claim("b1"), "b1_2");
        assert_eq!(namer.claim("b1"), "b1_3");
    }

    #[test]
    fn test_reserved_words_are_avoided() {
        let mut namer = Namer::new();
        assert_eq!(namer.claim("type"), "type_2");
        assert_eq!(namer.claim("Global"), "Global_2");
        assert!(namer.is_taken("CALCULATE"));
    }
}
