//! Sections: items that own a nested body

use super::context::{Context, LoopState};
use super::intent::ExecutionIntent;
use super::item::{ItemId, TriggerItem};
use crate::elements::{Condition, Expression};
use std::fmt;
use tracing::trace;

/// Cleanup run when a jump unwinds through a section.
///
/// Must be idempotent, must not fail and must not jump.
pub trait SectionExitHandler {
    fn exit(&self, cx: &mut Context<'_>);
}

#[derive(Debug)]
pub struct Section {
    pub(crate) first: Option<ItemId>,
    pub(crate) last: Option<ItemId>,
    pub(crate) intent: ExecutionIntent,
    pub(crate) kind: SectionKind,
}

#[derive(Debug)]
pub enum SectionKind {
    Conditional(Conditional),
    Loop(LoopSection),
    While(WhileSection),
}

/// One member of an `if` / `else if` / `else` chain
#[derive(Debug)]
pub struct Conditional {
    pub(crate) branch: Branch,
    /// `None` only for `else`
    pub(crate) condition: Option<Box<dyn Condition>>,
    /// First item after the whole chain
    pub(crate) skip_to: Option<ItemId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    If,
    ElseIf,
    Else,
}

/// `loop <expression>`
#[derive(Debug)]
pub struct LoopSection {
    pub(crate) id: ItemId,
    pub(crate) expression: Box<dyn Expression>,
}

/// `while <condition>`, or `do while` when the first pass is unconditional
#[derive(Debug)]
pub struct WhileSection {
    pub(crate) id: ItemId,
    pub(crate) condition: Box<dyn Condition>,
    pub(crate) do_while: bool,
}

impl Section {
    pub(crate) fn new(kind: SectionKind) -> Self {
        Section { first: None, last: None, intent: ExecutionIntent::None, kind }
    }

    pub fn kind(&self) -> &SectionKind {
        &self.kind
    }

    pub fn first(&self) -> Option<ItemId> {
        self.first
    }

    pub fn is_loop(&self) -> bool {
        matches!(self.kind, SectionKind::Loop(_) | SectionKind::While(_))
    }

    pub fn exit_handler(&self) -> Option<&dyn SectionExitHandler> {
        match &self.kind {
            SectionKind::Loop(section) => Some(section),
            SectionKind::While(section) => Some(section),
            SectionKind::Conditional(_) => None,
        }
    }

    /// Successor of the last body item: loops re-enter, conditionals skip the chain
    pub(crate) fn after_body(&self, own: ItemId) -> Option<ItemId> {
        match &self.kind {
            SectionKind::Conditional(conditional) => conditional.skip_to,
            SectionKind::Loop(_) | SectionKind::While(_) => Some(own),
        }
    }

    pub(crate) fn walk(&self, item: &TriggerItem, cx: &mut Context<'_>) -> Option<ItemId> {
        match &self.kind {
            SectionKind::Conditional(conditional) => {
                let taken = match &conditional.condition {
                    Some(condition) => condition.check(cx),
                    None => true,
                };
                if taken {
                    self.first.or(conditional.skip_to)
                } else {
                    item.next
                }
            }
            SectionKind::Loop(section) => section.walk(self, item, cx),
            SectionKind::While(section) => section.walk(self, item, cx),
        }
    }
}

impl LoopSection {
    fn walk(&self, section: &Section, item: &TriggerItem, cx: &mut Context<'_>) -> Option<ItemId> {
        if !cx.frame.loops.contains_key(&self.id) {
            let values = self.expression.values(cx);
            if values.is_empty() {
                trace!(target: "tripwire::walk", item = %self.id, "nothing to loop over");
                return item.next;
            }
            cx.frame.loops.insert(
                self.id,
                LoopState { pending: values.into(), ..LoopState::default() },
            );
        }

        let state = cx.frame.loops.get_mut(&self.id)?;
        match state.pending.pop_front() {
            Some(value) => {
                state.current = Some(value);
                state.iteration += 1;
                Some(section.first.unwrap_or(self.id))
            }
            None => {
                self.exit(cx);
                item.next
            }
        }
    }
}

impl SectionExitHandler for LoopSection {
    fn exit(&self, cx: &mut Context<'_>) {
        cx.frame.loops.remove(&self.id);
        trace!(target: "tripwire::walk", section = %self.id, "loop state cleared");
    }
}

impl WhileSection {
    fn walk(&self, section: &Section, item: &TriggerItem, cx: &mut Context<'_>) -> Option<ItemId> {
        let first_pass = self.do_while && !cx.frame.loops.contains_key(&self.id);
        if first_pass || self.condition.check(cx) {
            cx.frame.loops.entry(self.id).or_default().iteration += 1;
            Some(section.first.unwrap_or(self.id))
        } else {
            self.exit(cx);
            item.next
        }
    }
}

impl SectionExitHandler for WhileSection {
    fn exit(&self, cx: &mut Context<'_>) {
        cx.frame.loops.remove(&self.id);
        trace!(target: "tripwire::walk", section = %self.id, "loop state cleared");
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SectionKind::Conditional(Conditional { branch: Branch::Else, .. }) => f.write_str("else"),
            SectionKind::Conditional(Conditional { branch, condition, .. }) => {
                let keyword = if *branch == Branch::If { "if" } else { "else if" };
                match condition {
                    Some(condition) => write!(f, "{keyword} {condition:?}"),
                    None => f.write_str(keyword),
                }
            }
            SectionKind::Loop(section) => write!(f, "loop {:?}", section.expression),
            SectionKind::While(section) if section.do_while => write!(f, "do while {:?}", section.condition),
            SectionKind::While(section) => write!(f, "while {:?}", section.condition),
        }
    }
}
