//! Error types
//!
//! Two tiers: [`LoadError`] when a trigger cannot be built, and [`RuntimeError`]
//! for internal invariant violations during a walk. Missing runtime data is not an
//! error at all; it silently truncates the invocation.

use crate::engine::ItemId;
use crate::syntax::{Diagnostic, Severity};
use thiserror::Error;

/// A trigger failed to load. Holds every diagnostic collected while building it.
#[derive(Debug, Error)]
#[error("could not load '{label}': {}", first_error(.diagnostics))]
pub struct LoadError {
    pub label: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadError {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Whether any error message contains `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.errors().any(|d| d.message.contains(needle))
    }
}

fn first_error(diagnostics: &[Diagnostic]) -> String {
    let mut errors = diagnostics.iter().filter(|d| d.severity == Severity::Error);
    match (errors.next(), errors.count()) {
        (Some(first), 0) => first.to_string(),
        (Some(first), more) => format!("{first} (and {more} more)"),
        (None, _) => "no errors reported".to_string(),
    }
}

/// Fatal-for-this-invocation failures. Never raised for absent values.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("trigger '{label}' jumped to missing item {item}")]
    DanglingItem { label: String, item: ItemId },

    #[error("trigger '{label}' exceeded {limit} steps in a single walk")]
    StepLimit { label: String, limit: u64 },

    #[error("trigger '{label}' panicked: {message}")]
    Panicked { label: String, message: String },
}
