//! Dynamically typed values

use std::fmt;

use sheetc_core::CellError;

use crate::date::Date;

/// A value whose type is only known at run time
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dynamic {
    /// Blank cell
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Date(Date),
    Text(String),
    Error(CellError),
}

impl Dynamic {
    /// Numeric view; `None` for text that does not parse and for errors
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Dynamic::Empty => Some(0.0),
            Dynamic::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Dynamic::Number(n) => Some(*n),
            Dynamic::Date(d) => Some(d.serial()),
            Dynamic::Text(s) => parse_number(s),
            Dynamic::Error(_) => None,
        }
    }

    /// Boolean view; numbers are true when non-zero
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Empty => Some(false),
            Dynamic::Bool(b) => Some(*b),
            Dynamic::Number(n) => Some(*n != 0.0),
            Dynamic::Date(d) => Some(d.serial() != 0.0),
            Dynamic::Text(s) if s.eq_ignore_ascii_case("TRUE") => Some(true),
            Dynamic::Text(s) if s.eq_ignore_ascii_case("FALSE") => Some(false),
            Dynamic::Text(_) | Dynamic::Error(_) => None,
        }
    }

    /// Text as a cell would display it
    pub fn as_text(&self) -> String {
        match self {
            Dynamic::Empty => String::new(),
            Dynamic::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Dynamic::Number(n) => format_number(*n),
            Dynamic::Date(d) => format_number(d.serial()),
            Dynamic::Text(s) => s.clone(),
            Dynamic::Error(e) => e.as_str().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Dynamic::Empty)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Dynamic::Error(_))
    }

    /// Whether the value takes part in numeric aggregates
    pub fn is_numeric(&self) -> bool {
        matches!(self, Dynamic::Number(_) | Dynamic::Date(_))
    }
}

/// Parse text the way a cell would coerce it, including `12%`
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let value = match text.strip_suffix('%') {
        Some(percent) => percent.trim().parse::<f64>().ok().map(|n| n / 100.0),
        None => text.parse::<f64>().ok(),
    };
    value.filter(|n| n.is_finite())
}

/// Format a number without a trailing `.0` for integral values
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<f64> for Dynamic {
    /// Non-finite results become error values
    fn from(n: f64) -> Self {
        if n.is_nan() {
            Dynamic::Error(CellError::Num)
        } else if n.is_infinite() {
            Dynamic::Error(CellError::Div0)
        } else {
            Dynamic::Number(n)
        }
    }
}

impl From<bool> for Dynamic {
    fn from(b: bool) -> Self {
        Dynamic::Bool(b)
    }
}

impl From<Date> for Dynamic {
    fn from(d: Date) -> Self {
        Dynamic::Date(d)
    }
}

impl From<String> for Dynamic {
    fn from(s: String) -> Self {
        Dynamic::Text(s)
    }
}

impl From<&str> for Dynamic {
    fn from(s: &str) -> Self {
        Dynamic::Text(s.to_string())
    }
}

impl From<&String> for Dynamic {
    fn from(s: &String) -> Self {
        Dynamic::Text(s.clone())
    }
}

impl From<&Dynamic> for Dynamic {
    fn from(v: &Dynamic) -> Self {
        v.clone()
    }
}

impl From<CellError> for Dynamic {
    fn from(e: CellError) -> Self {
        Dynamic::Error(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Dynamic::Empty.as_number(), Some(0.0));
        assert_eq!(Dynamic::Bool(true).as_number(), Some(1.0));
        assert_eq!(Dynamic::from(" 12 ").as_number(), Some(12.0));
        assert_eq!(Dynamic::from("12%").as_number(), Some(0.12));
        assert_eq!(Dynamic::from("abc").as_number(), None);
        assert_eq!(Dynamic::from("nan").as_number(), None);
        assert_eq!(Dynamic::from("inf").as_number(), None);
    }

    #[test]
    fn test_non_finite_numbers_become_errors() {
        assert_eq!(Dynamic::from(1.0 / 0.0), Dynamic::Error(CellError::Div0));
        assert_eq!(Dynamic::from(f64::NAN), Dynamic::Error(CellError::Num));
    }

    #[test]
    fn test_display() {
        assert_eq!(Dynamic::from(3.0).to_string(), "3");
        assert_eq!(Dynamic::from(2.5).to_string(), "2.5");
        assert_eq!(Dynamic::from(true).to_string(), "TRUE");
        assert_eq!(Dynamic::from(CellError::Na).to_string(), "#N/A");
    }
}
