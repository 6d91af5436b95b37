//! Diagnostics with source location tracking.
//!
//! Every compile-time diagnostic in the toolchain carries a [`Span`] and a
//! [`Severity`]. Diagnostics accumulate rather than aborting the instant
//! they're produced — see `spicy_codegen::driver`, which reports everything
//! gathered during a failing pass before giving up.

use crate::span::Span;
use std::fmt;

/// How serious a [`Diagnostic`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational; does not affect pass success.
    Note,
    /// Something worth flagging but not fatal to the pass.
    Warning,
    /// The diagnostic's pass fails after the current unit finishes.
    Error,
}

/// A diagnostic annotated with its source location.
///
/// `kind` is a short machine-stable label (`"unresolved-id"`,
/// `"no-matching-operator"`, `"grammar-ambiguity"`, ...) so callers can
/// match on diagnostic category without parsing `message`.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: &'static str,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn error(kind: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Error, kind, message, span)
    }

    pub fn warning(kind: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Warning, kind, message, span)
    }

    pub fn note(kind: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Note, kind, message, span)
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{tag}[{}]: {} at {}..{}",
            self.kind, self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Alias for `std::result::Result<T, Diagnostic>`, used by single-error
/// fallible operations. Passes that collect multiple diagnostics use a
/// `Vec<Diagnostic>` sink instead (see `spicy_codegen::diagnostics`).
pub type Result<T> = std::result::Result<T, Diagnostic>;
