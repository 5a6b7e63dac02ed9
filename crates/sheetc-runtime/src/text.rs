//! Text functions
//!
//! Positions and lengths count characters, not bytes.

fn count(n: f64) -> usize {
    if n.is_nan() || n < 0.0 {
        0
    } else {
        n.trunc() as usize
    }
}

/// First `n` characters
pub fn left(s: impl AsRef<str>, n: f64) -> String {
    s.as_ref().chars().take(count(n)).collect()
}

/// Last `n` characters
pub fn right(s: impl AsRef<str>, n: f64) -> String {
    let chars: Vec<char> = s.as_ref().chars().collect();
    let n = count(n).min(chars.len());
    chars[chars.len() - n..].iter().collect()
}

/// `n` characters starting at 1-based position `start`
pub fn mid(s: impl AsRef<str>, start: f64, n: f64) -> String {
    let skip = count(start).saturating_sub(1);
    s.as_ref().chars().skip(skip).take(count(n)).collect()
}

pub fn len(s: impl AsRef<str>) -> f64 {
    s.as_ref().chars().count() as f64
}

pub fn upper(s: impl AsRef<str>) -> String {
    s.as_ref().to_uppercase()
}

pub fn lower(s: impl AsRef<str>) -> String {
    s.as_ref().to_lowercase()
}

/// Strip leading and trailing spaces and collapse inner runs to one space
pub fn trim(s: impl AsRef<str>) -> String {
    s.as_ref().split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ")
}

/// Case-sensitive equality
pub fn exact(a: impl AsRef<str>, b: impl AsRef<str>) -> bool {
    a.as_ref() == b.as_ref()
}
