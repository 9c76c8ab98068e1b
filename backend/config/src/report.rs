//! Diagnostics and the ordered report that collects them.

use crate::path::ContextPath;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A single finding, addressed by the path of the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: ContextPath,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.path, self.message)
    }
}

/// Ordered diagnostics from one or more checking passes.
///
/// Entries keep insertion order; [`Report::merge`] appends, so merging is
/// associative and a report built from a deterministic walk renders the same
/// way every time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub entries: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: ContextPath, severity: Severity, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            path,
            severity,
            message: message.into(),
        });
    }

    pub fn error(&mut self, path: ContextPath, message: impl fmt::Display) {
        self.add(path, Severity::Error, message.to_string());
    }

    pub fn warn(&mut self, path: ContextPath, message: impl fmt::Display) {
        self.add(path, Severity::Warning, message.to_string());
    }

    /// Append every entry of `other` after this report's entries.
    pub fn merge(&mut self, other: Report) {
        self.entries.extend(other.entries);
    }

    /// Prefix every entry's path with `prefix`.
    pub fn rooted_at(self, prefix: &ContextPath) -> Report {
        Report {
            entries: self
                .entries
                .into_iter()
                .map(|d| Diagnostic {
                    path: prefix.join(&d.path),
                    ..d
                })
                .collect(),
        }
    }

    /// True when at least one entry is an error.
    pub fn is_fatal(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
