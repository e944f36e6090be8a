//! Nonlocal jumps: continue, exit and return
//!
//! Targets and the sections to unwind are resolved once at load time. At runtime
//! a jump runs the exit handlers innermost first and hands back its target.

use super::context::Context;
use super::intent::ExecutionIntent;
use super::item::ItemId;
use crate::elements::Expression;
use crate::value::ValueType;

/// Re-enters an enclosing loop
#[derive(Debug)]
pub struct Continue {
    pub(crate) target: ItemId,
    /// Loop sections between here and `target`, innermost first
    pub(crate) exits: Vec<ItemId>,
    pub(crate) intent: ExecutionIntent,
}

impl Continue {
    pub(crate) fn walk(&self, cx: &mut Context<'_>) -> Option<ItemId> {
        cx.exit_sections(&self.exits);
        Some(self.target)
    }
}

/// Leaves one or more sections, or the whole trigger
#[derive(Debug)]
pub struct Exit {
    /// Outermost section left; `None` stops the trigger
    pub(crate) target: Option<ItemId>,
    pub(crate) exits: Vec<ItemId>,
    pub(crate) intent: ExecutionIntent,
}

impl Exit {
    pub(crate) fn walk(&self, cx: &mut Context<'_>) -> Option<ItemId> {
        cx.exit_sections(&self.exits);
        let section = self.target?;
        cx.trigger.graph().exit_target(section)
    }
}

/// Hands values back to the function call and ends the function body
#[derive(Debug)]
pub struct Return {
    pub(crate) value: Box<dyn Expression>,
    pub(crate) returns: ValueType,
    pub(crate) exits: Vec<ItemId>,
}

impl Return {
    pub(crate) fn walk(&self, cx: &mut Context<'_>) -> Option<ItemId> {
        let values = self
            .value
            .values(cx)
            .into_iter()
            .filter(|value| self.returns.matches(value))
            .collect();
        cx.frame.returned = Some(values);
        cx.exit_sections(&self.exits);
        None
    }
}
