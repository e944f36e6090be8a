//! Building triggers from parsed statements
//!
//! The parser produces a tree of [`Statement`]s. [`TriggerBuilder`] turns it into
//! an item graph: it links siblings and section bodies, resolves every jump
//! against the [`SectionStack`], tracks whether a delay may already have
//! happened, and reports problems as [`Diagnostic`]s.

pub mod ast;
pub mod builder;
pub mod diagnostics;
pub mod sections;


pub use ast::{ExitTarget, Statement};
pub use builder::{LoadContext, ReturnContract, TriggerBuilder};
pub use diagnostics::{Diagnostic, Loaded, Severity};
pub use sections::{OpenSection, SectionCategory, SectionFilter, SectionStack};

/// Three-valued truth, for facts that depend on which branch ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kleenean {
    False,
    Unknown,
    True,
}

impl Kleenean {
    pub fn is_false(self) -> bool {
        self == Kleenean::False
    }

    /// Agreement keeps the value, disagreement is `Unknown`
    pub fn merge(self, other: Kleenean) -> Kleenean {
        if self == other {
            self
        } else {
            Kleenean::Unknown
        }
    }
}
