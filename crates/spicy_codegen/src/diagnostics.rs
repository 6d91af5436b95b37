//! Diagnostic accumulation for the module driver.
//!
//! Restyled from `logicaffeine_compile::diagnostic`'s rustc-JSON bridge:
//! that module exists to translate a *different* compiler's error output
//! into user-facing text, which has no counterpart here since
//! `spicy-base::Diagnostic` is already the first-class error type every
//! pass in this workspace produces directly. What's kept is the shape —
//! a sink that accumulates non-fatal diagnostics across a pass and lets
//! the driver decide, once the pass finishes, whether to keep going.

use spicy_base::{Diagnostic, Severity};

/// Collects diagnostics produced over the course of one driver pass:
/// non-fatal diagnostics accumulate, and the driver reports them all
/// before aborting at the end of the failing pass.
#[derive(Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            log::error!("{}", diagnostic.message);
        } else {
            log::warn!("{}", diagnostic.message);
        }
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for d in diagnostics {
            self.push(d);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
