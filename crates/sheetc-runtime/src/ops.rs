//! Coercions and operators over dynamic values

use sheetc_core::CellError;

use crate::date::Date;
use crate::value::Dynamic;

/// Coerce to a number; values that do not coerce give NaN
pub fn num(value: impl Into<Dynamic>) -> f64 {
    value.into().as_number().unwrap_or(f64::NAN)
}

/// Coerce to a boolean; values that do not coerce are false
pub fn truthy(value: impl Into<Dynamic>) -> bool {
    value.into().as_bool().unwrap_or(false)
}

/// Coerce to display text
pub fn text(value: impl Into<Dynamic>) -> String {
    value.into().as_text()
}

/// Coerce to a date
pub fn date(value: impl Into<Dynamic>) -> Date {
    match value.into() {
        Dynamic::Date(d) => d,
        other => Date::from_serial(other.as_number().unwrap_or(f64::NAN)),
    }
}

/// `a + b` with date awareness: date plus days stays a date
pub fn add(a: impl Into<Dynamic>, b: impl Into<Dynamic>) -> Dynamic {
    match (a.into(), b.into()) {
        (Dynamic::Error(e), _) | (_, Dynamic::Error(e)) => Dynamic::Error(e),
        (Dynamic::Date(d), other) | (other, Dynamic::Date(d)) => match other.as_number() {
            Some(days) => Dynamic::Date(d + days),
            None => Dynamic::Error(CellError::Value),
        },
        (x, y) => match (x.as_number(), y.as_number()) {
            (Some(x), Some(y)) => Dynamic::from(x + y),
            _ => Dynamic::Error(CellError::Value),
        },
    }
}

/// `a - b`; date minus date is a day count, date minus days is a date
pub fn sub(a: impl Into<Dynamic>, b: impl Into<Dynamic>) -> Dynamic {
    match (a.into(), b.into()) {
        (Dynamic::Error(e), _) | (_, Dynamic::Error(e)) => Dynamic::Error(e),
        (Dynamic::Date(x), Dynamic::Date(y)) => Dynamic::from(x - y),
        (Dynamic::Date(d), other) => match other.as_number() {
            Some(days) => Dynamic::Date(d - days),
            None => Dynamic::Error(CellError::Value),
        },
        (x, y) => match (x.as_number(), y.as_number()) {
            (Some(x), Some(y)) => Dynamic::from(x - y),
            _ => Dynamic::Error(CellError::Value),
        },
    }
}

/// Join values as text
pub fn concat(parts: &[Dynamic]) -> String {
    parts.iter().map(Dynamic::as_text).collect()
}

/// `value` unless it is an error
pub fn if_error(value: impl Into<Dynamic>, fallback: impl Into<Dynamic>) -> Dynamic {
    match value.into() {
        Dynamic::Error(_) => fallback.into(),
        value => value,
    }
}

/// True when every value is truthy; non-boolean text is ignored
pub fn and(values: &[Dynamic]) -> bool {
    values.iter().filter_map(Dynamic::as_bool).all(|b| b)
}

/// True when any value is truthy
pub fn or(values: &[Dynamic]) -> bool {
    values.iter().filter_map(Dynamic::as_bool).any(|b| b)
}

pub fn is_blank(value: impl Into<Dynamic>) -> bool {
    value.into().is_empty()
}

pub fn is_number(value: impl Into<Dynamic>) -> bool {
    value.into().is_numeric()
}

pub fn is_text(value: impl Into<Dynamic>) -> bool {
    matches!(value.into(), Dynamic::Text(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercions() {
        assert_eq!(num(true), 1.0);
        assert_eq!(num("2.5"), 2.5);
        assert!(num("abc").is_nan());
        assert!(truthy(2.0));
        assert!(!truthy("maybe"));
        assert_eq!(text(4.0), "4");
        assert_eq!(date(45306.0), Date::from_ymd(2024.0, 1.0, 15.0));
    }

    #[test]
    fn test_add_and_sub_with_dates() {
        let d = Date::from_ymd(2024.0, 1.0, 1.0);
        assert_eq!(add(d, 31.0), Dynamic::Date(Date::from_ymd(2024.0, 2.0, 1.0)));
        assert_eq!(add(1.0, d), Dynamic::Date(d + 1.0));
        assert_eq!(sub(d + 10.0, d), Dynamic::Number(10.0));
        assert_eq!(sub(5.0, "2"), Dynamic::Number(3.0));
        assert_eq!(add("x", 1.0), Dynamic::Error(CellError::Value));
        assert_eq!(add("nan", 1.0), Dynamic::Error(CellError::Value));
    }

    #[test]
    fn test_logical_and_errors() {
        assert!(and(&[true.into(), 1.0.into()]));
        assert!(!and(&[true.into(), false.into()]));
        assert!(or(&[false.into(), "TRUE".into()]));
        assert_eq!(if_error(CellError::Na, 0.0), Dynamic::Number(0.0));
        assert_eq!(if_error(5.0, 0.0), Dynamic::Number(5.0));
        assert_eq!(concat(&["a".into(), 1.0.into(), true.into()]), "a1TRUE");
    }
}
