//! Diagnostics stream
//!
//! Every phase appends to a [`Diagnostics`] log instead of failing. Entries are
//! also forwarded to `tracing` at the matching level so a subscriber sees them as
//! they happen.

use std::fmt;

use chrono::{DateTime, Utc};

/// Severity of a diagnostic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic entry
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Offending cell, e.g. `B1` or `Sheet2!A3`
    pub address: Option<String>,
    /// Raw formula text of the offending cell
    pub formula: Option<String>,
}

impl Diagnostic {
    /// Create an entry stamped with the current time
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            timestamp: Utc::now(),
            address: None,
            formula: None,
        }
    }

    /// Attach the offending address
    pub fn at(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Attach the raw formula text
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.severity
        )?;
        if let Some(address) = &self.address {
            write!(f, " {}", address)?;
        }
        if let Some(formula) = &self.formula {
            write!(f, " ({})", formula)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Append-only, ordered diagnostics log
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info | Severity::Success => tracing::info!("{diagnostic}"),
            Severity::Warning => tracing::warn!("{diagnostic}"),
            Severity::Error => tracing::error!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Info, message));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Success, message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Warning, message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Error, message));
    }

    /// Warning tied to a cell and, when present, its formula
    pub fn warning_at(
        &mut self,
        address: impl Into<String>,
        formula: Option<&str>,
        message: impl Into<String>,
    ) {
        self.push(located(Severity::Warning, address, formula, message));
    }

    /// Error tied to a cell and, when present, its formula
    pub fn error_at(
        &mut self,
        address: impl Into<String>,
        formula: Option<&str>,
        message: impl Into<String>,
    ) {
        self.push(located(Severity::Error, address, formula, message));
    }

    /// All entries in the order they were recorded
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Entries of one severity
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.severity == severity)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.with_severity(severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn located(
    severity: Severity,
    address: impl Into<String>,
    formula: Option<&str>,
    message: impl Into<String>,
) -> Diagnostic {
    let diagnostic = Diagnostic::new(severity, message).at(address);
    match formula {
        Some(formula) => diagnostic.with_formula(formula),
        None => diagnostic,
    }
}
