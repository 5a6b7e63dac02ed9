//! Comparison helpers
//!
//! Mixed-type ordering follows the spreadsheet rule: numbers (and dates) sort
//! before text, text before booleans, and errors last. Text compares without
//! regard to case.

use std::cmp::Ordering;

use crate::value::Dynamic;

fn rank(value: &Dynamic) -> u8 {
    match value {
        Dynamic::Empty | Dynamic::Number(_) | Dynamic::Date(_) => 0,
        Dynamic::Text(_) => 1,
        Dynamic::Bool(_) => 2,
        Dynamic::Error(_) => 3,
    }
}

/// A blank takes the shape of whatever it is compared with
fn blank_like(other: &Dynamic) -> Dynamic {
    match other {
        Dynamic::Text(_) => Dynamic::Text(String::new()),
        Dynamic::Bool(_) => Dynamic::Bool(false),
        _ => Dynamic::Number(0.0),
    }
}

/// Order two values of any type
pub fn compare(a: impl Into<Dynamic>, b: impl Into<Dynamic>) -> Ordering {
    let (a, b) = (a.into(), b.into());
    let a = if a.is_empty() { blank_like(&b) } else { a };
    let b = if b.is_empty() { blank_like(&a) } else { b };

    match (&a, &b) {
        (Dynamic::Text(x), Dynamic::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Dynamic::Bool(x), Dynamic::Bool(y)) => x.cmp(y),
        _ if rank(&a) == 0 && rank(&b) == 0 => {
            let x = a.as_number().unwrap_or(0.0);
            let y = b.as_number().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => rank(&a).cmp(&rank(&b)),
    }
}

/// Case-insensitive text equality
pub fn text_eq(a: impl AsRef<str>, b: impl AsRef<str>) -> bool {
    a.as_ref().to_lowercase() == b.as_ref().to_lowercase()
}

pub fn eq(a: impl Into<Dynamic>, b: impl Into<Dynamic>) -> bool {
    compare(a, b) == Ordering::Equal
}

pub fn ne(a: impl Into<Dynamic>, b: impl Into<Dynamic>) -> bool {
    compare(a, b) != Ordering::Equal
}

pub fn lt(a: impl Into<Dynamic>, b: impl Into<Dynamic>) -> bool {
    compare(a, b) == Ordering::Less
}

pub fn le(a: impl Into<Dynamic>, b: impl Into<Dynamic>) -> bool {
    compare(a, b) != Ordering::Greater
}

pub fn gt(a: impl Into<Dynamic>, b: impl Into<Dynamic>) -> bool {
    compare(a, b) == Ordering::Greater
}

pub fn ge(a: impl Into<Dynamic>, b: impl Into<Dynamic>) -> bool {
    compare(a, b) != Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_case_insensitive() {
        assert!(text_eq("Apple", "APPLE"));
        assert!(eq("apple", "APPLE"));
        assert!(lt("apple", "Banana"));
    }

    #[test]
    fn test_mixed_types() {
        assert!(lt(100.0, "1"));
        assert!(lt("zzz", true));
        assert!(ne("1", 1.0));
        assert!(gt(true, false));
    }

    #[test]
    fn test_blanks() {
        assert!(eq(Dynamic::Empty, 0.0));
        assert!(eq(Dynamic::Empty, ""));
        assert!(eq(Dynamic::Empty, false));
        assert!(lt(Dynamic::Empty, 1.0));
    }
}
