//! Math and aggregate functions
//!
//! Aggregates take every argument flattened into one slice. Numbers and dates
//! count; text, booleans and blanks are skipped, as they are inside ranges.

use crate::value::Dynamic;

fn numbers(values: &[Dynamic]) -> impl Iterator<Item = f64> + '_ {
    values
        .iter()
        .filter(|v| v.is_numeric())
        .filter_map(Dynamic::as_number)
}

pub fn sum(values: &[Dynamic]) -> f64 {
    numbers(values).sum()
}

/// Mean of the numeric values; NaN when there are none
pub fn average(values: &[Dynamic]) -> f64 {
    let (total, n) = numbers(values).fold((0.0, 0usize), |(t, n), x| (t + x, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        total / n as f64
    }
}

/// Smallest numeric value; 0 when there are none
pub fn min(values: &[Dynamic]) -> f64 {
    numbers(values).reduce(f64::min).unwrap_or(0.0)
}

/// Largest numeric value; 0 when there are none
pub fn max(values: &[Dynamic]) -> f64 {
    numbers(values).reduce(f64::max).unwrap_or(0.0)
}

pub fn count(values: &[Dynamic]) -> f64 {
    numbers(values).count() as f64
}

pub fn counta(values: &[Dynamic]) -> f64 {
    values.iter().filter(|v| !v.is_empty()).count() as f64
}

/// Product of the numeric values; 0 when there are none
pub fn product(values: &[Dynamic]) -> f64 {
    numbers(values).reduce(|a, b| a * b).unwrap_or(0.0)
}

/// Apply `f` to `value` shifted by `digits` decimal places, then shift back
///
/// Negative digits divide instead of multiplying by an inexact `10^-n`.
fn at_digits(value: f64, digits: f64, f: impl Fn(f64) -> f64) -> f64 {
    let digits = digits.trunc() as i32;
    let factor = 10f64.powi(digits.abs());
    if digits >= 0 {
        f(value * factor) / factor
    } else {
        f(value / factor) * factor
    }
}

/// Drop float noise such as 2.0000000000000004 before ceil or trunc
fn settle(scaled: f64) -> f64 {
    (scaled * 1e9).round() / 1e9
}

/// Round half away from zero to `digits` decimals (negative rounds left of the point)
pub fn round(value: f64, digits: f64) -> f64 {
    at_digits(value, digits, f64::round)
}

/// Round away from zero
pub fn roundup(value: f64, digits: f64) -> f64 {
    at_digits(value, digits, |x| settle(x).abs().ceil().copysign(x))
}

/// Round toward zero
pub fn rounddown(value: f64, digits: f64) -> f64 {
    at_digits(value, digits, |x| settle(x).trunc())
}

/// Round down to the nearest integer
pub fn int(value: f64) -> f64 {
    value.floor()
}

/// Remainder with the sign of the divisor; NaN for a zero divisor
pub fn modulo(value: f64, divisor: f64) -> f64 {
    if divisor == 0.0 {
        return f64::NAN;
    }
    value - divisor * (value / divisor).floor()
}

/// -1, 0 or 1
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Vec<Dynamic> {
        vec![
            Dynamic::from(1.0),
            Dynamic::from("text"),
            Dynamic::Empty,
            Dynamic::from(3.0),
            Dynamic::from(true),
        ]
    }

    #[test]
    fn test_aggregates_skip_non_numbers() {
        let v = values();
        assert_eq!(sum(&v), 4.0);
        assert_eq!(average(&v), 2.0);
        assert_eq!(min(&v), 1.0);
        assert_eq!(max(&v), 3.0);
        assert_eq!(count(&v), 2.0);
        assert_eq!(counta(&v), 4.0);
        assert_eq!(product(&v), 3.0);
    }

    #[test]
    fn test_empty_aggregates() {
        assert_eq!(sum(&[]), 0.0);
        assert_eq!(max(&[]), 0.0);
        assert_eq!(product(&[]), 0.0);
        assert!(average(&[]).is_nan());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round(2.5, 0.0), 3.0);
        assert_eq!(round(-2.5, 0.0), -3.0);
        assert_eq!(round(1234.5678, 2.0), 1234.57);
        assert_eq!(round(1234.5678, -2.0), 1200.0);
        assert_eq!(roundup(3.2, 0.0), 4.0);
        assert_eq!(roundup(-3.2, 0.0), -4.0);
        assert_eq!(roundup(2.0, 0.0), 2.0);
        assert_eq!(rounddown(3.9, 0.0), 3.0);
        assert_eq!(rounddown(-3.9, 0.0), -3.0);
    }

    #[test]
    fn test_modulo_and_sign() {
        assert_eq!(modulo(5.0, 3.0), 2.0);
        assert_eq!(modulo(-5.0, 3.0), 1.0);
        assert_eq!(modulo(5.0, -3.0), -1.0);
        assert!(modulo(1.0, 0.0).is_nan());
        assert_eq!(sign(-0.5), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(int(-1.5), -2.0);
    }
}
