//! Lookup functions
//!
//! Tables arrive as materialized row-major matrices. Out-of-range indices give
//! `#REF!` or `#VALUE!`, a missing key gives `#N/A`.

use std::cmp::Ordering;

use sheetc_core::CellError;

use crate::compare::{compare, text_eq};
use crate::value::{parse_number, Dynamic};

fn values_equal(a: &Dynamic, b: &Dynamic) -> bool {
    match (a, b) {
        (Dynamic::Text(x), Dynamic::Text(y)) => text_eq(x, y),
        (Dynamic::Number(x), Dynamic::Text(s)) | (Dynamic::Text(s), Dynamic::Number(x)) => {
            parse_number(s) == Some(*x)
        }
        _ => compare(a, b) == Ordering::Equal,
    }
}

fn same_kind(a: &Dynamic, b: &Dynamic) -> bool {
    a.is_numeric() && b.is_numeric()
        || matches!((a, b), (Dynamic::Text(_), Dynamic::Text(_)))
        || matches!((a, b), (Dynamic::Bool(_), Dynamic::Bool(_)))
}

/// 1-based position of `key` in `keys`
///
/// Exact matching compares for equality; approximate matching assumes ascending
/// keys and returns the last key not greater than `key`.
fn find(key: &Dynamic, keys: &[&Dynamic], approximate: bool) -> Option<usize> {
    if !approximate {
        return keys.iter().position(|k| values_equal(key, k)).map(|i| i + 1);
    }
    let mut found = None;
    for (i, k) in keys.iter().enumerate() {
        if !same_kind(key, k) {
            continue;
        }
        match compare(*k, key) {
            Ordering::Greater => break,
            _ => found = Some(i + 1),
        }
    }
    found
}

fn position(index: f64, len: usize) -> Result<usize, CellError> {
    if index.is_nan() || index < 1.0 {
        return Err(CellError::Value);
    }
    let index = index.trunc() as usize;
    if index > len {
        Err(CellError::Ref)
    } else {
        Ok(index - 1)
    }
}

/// VLOOKUP(key, table, column, approximate)
pub fn vlookup(
    key: impl Into<Dynamic>,
    table: &[Vec<Dynamic>],
    column: f64,
    approximate: bool,
) -> Dynamic {
    let key = key.into();
    if let Dynamic::Error(e) = key {
        return Dynamic::Error(e);
    }
    let width = table.first().map_or(0, Vec::len);
    let col = match position(column, width) {
        Ok(col) => col,
        Err(e) => return Dynamic::Error(e),
    };
    let keys: Vec<&Dynamic> = table.iter().filter_map(|row| row.first()).collect();
    match find(&key, &keys, approximate) {
        Some(row) => table[row - 1].get(col).cloned().unwrap_or_default(),
        None => Dynamic::Error(CellError::Na),
    }
}

/// HLOOKUP(key, table, row, approximate)
pub fn hlookup(
    key: impl Into<Dynamic>,
    table: &[Vec<Dynamic>],
    row: f64,
    approximate: bool,
) -> Dynamic {
    let key = key.into();
    if let Dynamic::Error(e) = key {
        return Dynamic::Error(e);
    }
    let row = match position(row, table.len()) {
        Ok(row) => row,
        Err(e) => return Dynamic::Error(e),
    };
    let keys: Vec<&Dynamic> = table.first().map(|r| r.iter().collect()).unwrap_or_default();
    match find(&key, &keys, approximate) {
        Some(col) => table[row].get(col - 1).cloned().unwrap_or_default(),
        None => Dynamic::Error(CellError::Na),
    }
}

/// INDEX(table, row, column)
pub fn index(table: &[Vec<Dynamic>], row: f64, column: f64) -> Dynamic {
    let width = table.first().map_or(0, Vec::len);
    let located = position(row, table.len()).and_then(|r| Ok((r, position(column, width)?)));
    match located {
        Ok((r, c)) => table[r].get(c).cloned().unwrap_or_default(),
        Err(e) => Dynamic::Error(e),
    }
}

/// MATCH(key, values, kind) as a 1-based position
///
/// `kind` 0 is exact, 1 is the largest value not above `key` in ascending data,
/// -1 is the smallest value not below `key` in descending data.
pub fn match_position(key: impl Into<Dynamic>, values: &[Dynamic], kind: f64) -> Dynamic {
    let key = key.into();
    if let Dynamic::Error(e) = key {
        return Dynamic::Error(e);
    }
    let refs: Vec<&Dynamic> = values.iter().collect();
    let found = if kind == 0.0 {
        find(&key, &refs, false)
    } else if kind > 0.0 {
        find(&key, &refs, true)
    } else {
        let mut found = None;
        for (i, v) in values.iter().enumerate() {
            if !same_kind(&key, v) {
                continue;
            }
            match compare(v, &key) {
                Ordering::Less => break,
                _ => found = Some(i + 1),
            }
        }
        found
    };
    match found {
        Some(pos) => Dynamic::Number(pos as f64),
        None => Dynamic::Error(CellError::Na),
    }
}

/// CHOOSE(index, options)
pub fn choose(index: f64, options: &[Dynamic]) -> Dynamic {
    match position(index, options.len()) {
        Ok(i) => options[i].clone(),
        Err(_) => Dynamic::Error(CellError::Value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<Vec<Dynamic>> {
        vec![
            vec![1.0.into(), "one".into()],
            vec![5.0.into(), "five".into()],
            vec![10.0.into(), "ten".into()],
        ]
    }

    #[test]
    fn test_vlookup() {
        let t = table();
        assert_eq!(vlookup(5.0, &t, 2.0, false), Dynamic::from("five"));
        assert_eq!(vlookup(7.0, &t, 2.0, false), Dynamic::Error(CellError::Na));
        assert_eq!(vlookup(7.0, &t, 2.0, true), Dynamic::from("five"));
        assert_eq!(vlookup(0.5, &t, 2.0, true), Dynamic::Error(CellError::Na));
        assert_eq!(vlookup(5.0, &t, 3.0, false), Dynamic::Error(CellError::Ref));
        assert_eq!(vlookup(5.0, &t, 0.0, false), Dynamic::Error(CellError::Value));
    }

    #[test]
    fn test_vlookup_text_keys_ignore_case() {
        let t = vec![vec!["Apple".into(), 3.0.into()], vec!["Pear".into(), 4.0.into()]];
        assert_eq!(vlookup("PEAR", &t, 2.0, false), Dynamic::Number(4.0));
    }

    #[test]
    fn test_lookup_and_equality_fold_case_alike() {
        let t = vec![vec!["Äpfel".into(), 1.0.into()], vec!["ÉCOLE".into(), 2.0.into()]];
        assert_eq!(vlookup("äPFEL", &t, 2.0, false), Dynamic::Number(1.0));
        assert_eq!(vlookup("école", &t, 2.0, false), Dynamic::Number(2.0));
        assert!(text_eq("äPFEL", "Äpfel"));

        let keys = vec![Dynamic::from("Straße"), Dynamic::from("ÖL")];
        assert_eq!(match_position("öl", &keys, 0.0), Dynamic::Number(2.0));
    }

    #[test]
    fn test_hlookup() {
        let t = vec![
            vec!["a".into(), "b".into(), "c".into()],
            vec![1.0.into(), 2.0.into(), 3.0.into()],
        ];
        assert_eq!(hlookup("b", &t, 2.0, false), Dynamic::Number(2.0));
        assert_eq!(hlookup("z", &t, 2.0, false), Dynamic::Error(CellError::Na));
    }

    #[test]
    fn test_index_and_match() {
        let t = table();
        assert_eq!(index(&t, 3.0, 2.0), Dynamic::from("ten"));
        assert_eq!(index(&t, 4.0, 1.0), Dynamic::Error(CellError::Ref));

        let column: Vec<Dynamic> = t.iter().map(|r| r[0].clone()).collect();
        assert_eq!(match_position(10.0, &column, 0.0), Dynamic::Number(3.0));
        assert_eq!(match_position(6.0, &column, 1.0), Dynamic::Number(2.0));
        assert_eq!(match_position(6.0, &column, 0.0), Dynamic::Error(CellError::Na));

        let descending: Vec<Dynamic> = column.into_iter().rev().collect();
        assert_eq!(match_position(6.0, &descending, -1.0), Dynamic::Number(1.0));
    }

    #[test]
    fn test_choose() {
        let options = vec![Dynamic::from("a"), Dynamic::from("b")];
        assert_eq!(choose(2.0, &options), Dynamic::from("b"));
        assert_eq!(choose(3.0, &options), Dynamic::Error(CellError::Value));
    }
}
