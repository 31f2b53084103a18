//! Structured diagnostics for table interpretation
//!
//! Table scanning never aborts on suspicious input; instead it records typed
//! diagnostics that are returned to the caller alongside the extracted
//! forms. Callers can surface, count or ignore them, and tests can assert on
//! them without capturing log output.
//!
//! ## Example
//!
//! ```rust
//! use flexion::diagnostics::{Diagnostic, DiagnosticLevel, DiagnosticSink};
//!
//! let mut sink = DiagnosticSink::new();
//! sink.add(Diagnostic::new(DiagnosticLevel::Warning, "unrecognized header").with_text("Paucal"));
//! assert_eq!(sink.warnings(), 1);
//! ```

use std::fmt;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    /// Informational note
    Info,
    /// Warning - interpretation might be incomplete for this cell
    Warning,
    /// Error - a cell or table could not be interpreted
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic message with enough context to be actionable
/// without the original document.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level
    pub level: DiagnosticLevel,
    /// Human-readable message
    pub message: String,
    /// Headword being processed
    pub word: Option<String>,
    /// Language of the table
    pub lang: Option<String>,
    /// The offending cell or header text
    pub text: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            word: None,
            lang: None,
            text: None,
        }
    }

    /// Add the headword and language being processed
    pub fn with_context(mut self, word: impl Into<String>, lang: impl Into<String>) -> Self {
        self.word = Some(word.into());
        self.lang = Some(lang.into());
        self
    }

    /// Add the offending cell text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)?;
        match (&self.word, &self.lang) {
            (Some(w), Some(l)) => write!(f, " [{}/{}]", w, l)?,
            (Some(w), None) => write!(f, " [{}]", w)?,
            (None, Some(l)) => write!(f, " [{}]", l)?,
            (None, None) => {}
        }
        if let Some(ref text) = self.text {
            write!(f, ": {:?}", text)?;
        }
        Ok(())
    }
}

/// Accumulator for diagnostics produced while scanning one or more tables.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
    infos: usize,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic
    pub fn add(&mut self, diag: Diagnostic) {
        match diag.level {
            DiagnosticLevel::Error => self.errors += 1,
            DiagnosticLevel::Warning => self.warnings += 1,
            DiagnosticLevel::Info => self.infos += 1,
        }
        self.diagnostics.push(diag);
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    pub fn infos(&self) -> usize {
        self.infos
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Consume the sink, returning the accumulated diagnostics
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.errors > 0 {
            parts.push(format!(
                "{} error{}",
                self.errors,
                if self.errors == 1 { "" } else { "s" }
            ));
        }
        if self.warnings > 0 {
            parts.push(format!(
                "{} warning{}",
                self.warnings,
                if self.warnings == 1 { "" } else { "s" }
            ));
        }
        if self.infos > 0 {
            parts.push(format!(
                "{} note{}",
                self.infos,
                if self.infos == 1 { "" } else { "s" }
            ));
        }
        if parts.is_empty() {
            "no issues found".to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_context() {
        let diag = Diagnostic::new(DiagnosticLevel::Warning, "unrecognized header")
            .with_context("kissa", "Finnish")
            .with_text("Paucal");
        let s = diag.to_string();
        assert!(s.contains("warning"));
        assert!(s.contains("kissa/Finnish"));
        assert!(s.contains("Paucal"));
    }

    #[test]
    fn test_sink_counts() {
        let mut sink = DiagnosticSink::new();
        sink.add(Diagnostic::new(DiagnosticLevel::Error, "a"));
        sink.add(Diagnostic::new(DiagnosticLevel::Warning, "b"));
        sink.add(Diagnostic::new(DiagnosticLevel::Warning, "c"));
        assert_eq!(sink.errors(), 1);
        assert_eq!(sink.warnings(), 2);
        assert_eq!(sink.infos(), 0);
        let summary = sink.summary();
        assert!(summary.contains("1 error"));
        assert!(summary.contains("2 warnings"));
    }

    #[test]
    fn test_empty_summary() {
        let sink = DiagnosticSink::new();
        assert_eq!(sink.summary(), "no issues found");
    }
}
