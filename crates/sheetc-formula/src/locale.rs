//! Locale normalization
//!
//! Workbooks saved under a comma-decimal locale write `=ROUND(A1;2)*1,5`. The parser
//! only understands the invariant dialect, so formulas from such workbooks go
//! through [`normalize_locale`] once, before parsing.

/// Rewrite a locale formula into the invariant dialect
///
/// `,` becomes `.` (decimal separator) and `;` becomes `,` (argument separator).
/// String literals, quoted sheet names and array constants are left untouched.
///
/// ```rust
/// use sheetc_formula::normalize_locale;
///
/// assert_eq!(normalize_locale("=ROUND(A1;2)*1,5"), "=ROUND(A1,2)*1.5");
/// assert_eq!(normalize_locale("=\"a;b\"&B1"), "=\"a;b\"&B1");
/// ```
pub fn normalize_locale(formula: &str) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut in_string = false;
    let mut in_sheet = false;
    let mut brace_depth = 0usize;

    for c in formula.chars() {
        match c {
            '"' if !in_sheet => {
                in_string = !in_string;
                out.push(c);
            }
            '\'' if !in_string => {
                in_sheet = !in_sheet;
                out.push(c);
            }
            _ if in_string || in_sheet => out.push(c),
            '{' => {
                brace_depth += 1;
                out.push(c);
            }
            '}' => {
                brace_depth = brace_depth.saturating_sub(1);
                out.push(c);
            }
            _ if brace_depth > 0 => out.push(c),
            ',' => out.push('.'),
            ';' => out.push(','),
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separators_are_swapped() {
        assert_eq!(normalize_locale("=SUM(A1;B1;2,5)"), "=SUM(A1,B1,2.5)");
    }

    #[test]
    fn test_strings_and_sheets_untouched() {
        assert_eq!(
            normalize_locale("='a;b,c'!A1&\"x;y,z\""),
            "='a;b,c'!A1&\"x;y,z\""
        );
    }

    #[test]
    fn test_doubled_quotes_inside_strings() {
        // "" toggles twice, leaving the scanner inside the literal
        assert_eq!(normalize_locale("=\"a\"\";\"&1,5"), "=\"a\"\";\"&1.5");
    }

    #[test]
    fn test_array_constants_untouched() {
        assert_eq!(normalize_locale("=SUM({1;2};3)"), "=SUM({1;2},3)");
    }

    #[test]
    fn test_invariant_formula_without_separators_is_stable() {
        assert_eq!(normalize_locale("=A1*2"), "=A1*2");
    }
}
