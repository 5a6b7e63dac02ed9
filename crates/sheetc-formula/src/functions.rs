//! Built-in function registry
//!
//! The registry records what a code generator needs to know before it can accept a
//! call: the argument count range, a category used to pick a translation strategy,
//! and whether the function is volatile. Anything not registered is treated as a
//! user-defined function.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Broad family a function belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCategory {
    Math,
    Aggregate,
    Logical,
    Text,
    Date,
    Lookup,
    Info,
}

/// Function definition
#[derive(Debug, Clone)]
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Family, used to pick a translation strategy
    pub category: FunctionCategory,
    /// Is volatile (result changes between evaluations)
    pub volatile: bool,
}

impl FunctionDef {
    /// Whether `count` arguments is acceptable
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Human-readable arity, e.g. `2..=3` or `1..`
    pub fn arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{}..={}", self.min_args, max),
            None => format!("{}..", self.min_args),
        }
    }
}

/// Function registry
#[derive(Debug)]
pub struct FunctionRegistry {
    functions: HashMap<&'static str, FunctionDef>,
}

static BUILTINS: OnceLock<FunctionRegistry> = OnceLock::new();

impl FunctionRegistry {
    /// Shared registry holding every built-in function
    pub fn builtins() -> &'static FunctionRegistry {
        BUILTINS.get_or_init(FunctionRegistry::new)
    }

    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        use FunctionCategory::*;

        let mut registry = Self {
            functions: HashMap::new(),
        };

        // (name, min, max, category, volatile)
        let table: &[(&'static str, usize, Option<usize>, FunctionCategory, bool)] = &[
            ("SUM", 1, None, Aggregate, false),
            ("AVERAGE", 1, None, Aggregate, false),
            ("MIN", 1, None, Aggregate, false),
            ("MAX", 1, None, Aggregate, false),
            ("COUNT", 1, None, Aggregate, false),
            ("COUNTA", 1, None, Aggregate, false),
            ("PRODUCT", 1, None, Aggregate, false),
            ("ABS", 1, Some(1), Math, false),
            ("ROUND", 2, Some(2), Math, false),
            ("ROUNDUP", 2, Some(2), Math, false),
            ("ROUNDDOWN", 2, Some(2), Math, false),
            ("INT", 1, Some(1), Math, false),
            ("MOD", 2, Some(2), Math, false),
            ("POWER", 2, Some(2), Math, false),
            ("SQRT", 1, Some(1), Math, false),
            ("EXP", 1, Some(1), Math, false),
            ("LN", 1, Some(1), Math, false),
            ("LOG10", 1, Some(1), Math, false),
            ("PI", 0, Some(0), Math, false),
            ("SIGN", 1, Some(1), Math, false),
            ("IF", 2, Some(3), Logical, false),
            ("AND", 1, None, Logical, false),
            ("OR", 1, None, Logical, false),
            ("NOT", 1, Some(1), Logical, false),
            ("TRUE", 0, Some(0), Logical, false),
            ("FALSE", 0, Some(0), Logical, false),
            ("IFERROR", 2, Some(2), Logical, false),
            ("ISBLANK", 1, Some(1), Info, false),
            ("ISNUMBER", 1, Some(1), Info, false),
            ("ISTEXT", 1, Some(1), Info, false),
            ("CONCATENATE", 1, None, Text, false),
            ("LEFT", 1, Some(2), Text, false),
            ("RIGHT", 1, Some(2), Text, false),
            ("MID", 3, Some(3), Text, false),
            ("LEN", 1, Some(1), Text, false),
            ("UPPER", 1, Some(1), Text, false),
            ("LOWER", 1, Some(1), Text, false),
            ("TRIM", 1, Some(1), Text, false),
            ("EXACT", 2, Some(2), Text, false),
            ("DATE", 3, Some(3), Date, false),
            ("YEAR", 1, Some(1), Date, false),
            ("MONTH", 1, Some(1), Date, false),
            ("DAY", 1, Some(1), Date, false),
            ("TODAY", 0, Some(0), Date, true),
            ("NOW", 0, Some(0), Date, true),
            ("VLOOKUP", 3, Some(4), Lookup, false),
            ("HLOOKUP", 3, Some(4), Lookup, false),
            ("INDEX", 2, Some(3), Lookup, false),
            ("MATCH", 2, Some(3), Lookup, false),
            ("CHOOSE", 2, None, Lookup, false),
        ];

        for &(name, min_args, max_args, category, volatile) in table {
            registry.register(FunctionDef {
                name,
                min_args,
                max_args,
                category,
                volatile,
            });
        }

        registry
    }

    /// Look up a function by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name.to_uppercase().as_str())
    }

    /// Whether the name is a registered built-in
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
