//! Per-step execution context and per-invocation state

use super::item::ItemId;
use super::section::SectionKind;
use super::trigger::Trigger;
use crate::event::Event;
use crate::host::Runtime;
use crate::value::Value;
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// State owned by one trigger invocation.
///
/// Moves into the continuation when the invocation is delayed, so loop state and
/// return slots survive the suspension and never leak into other invocations.
#[derive(Debug)]
pub struct Frame {
    pub(crate) invocation: Uuid,
    pub(crate) loops: HashMap<ItemId, LoopState>,
    pub(crate) returned: Option<Vec<Value>>,
}

impl Frame {
    pub fn new() -> Self {
        Frame {
            invocation: Uuid::new_v4(),
            loops: HashMap::new(),
            returned: None,
        }
    }

    pub fn invocation(&self) -> Uuid {
        self.invocation
    }

    /// Values stored by a `return`, if one ran
    pub fn take_returned(&mut self) -> Option<Vec<Value>> {
        self.returned.take()
    }

    /// Number of loops currently holding iteration state
    pub fn active_loops(&self) -> usize {
        self.loops.len()
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub(crate) struct LoopState {
    pub(crate) pending: VecDeque<Value>,
    pub(crate) current: Option<Value>,
    pub(crate) iteration: u64,
}

/// What an item sees while it is being walked
pub struct Context<'a> {
    pub(crate) event: &'a Event,
    pub(crate) runtime: &'a Runtime,
    pub(crate) trigger: &'a Trigger,
    pub(crate) frame: &'a mut Frame,
    pub(crate) current: ItemId,
}

impl<'a> Context<'a> {
    pub fn event(&self) -> &'a Event {
        self.event
    }

    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    pub fn trigger(&self) -> &'a Trigger {
        self.trigger
    }

    /// The item being walked
    pub fn item(&self) -> ItemId {
        self.current
    }

    /// Whether this event has already been through a delay
    pub fn is_delayed(&self) -> bool {
        self.runtime.is_delayed(self.event)
    }

    pub fn local(&self, name: &str) -> Option<Value> {
        self.runtime.variables().get_local(self.event, name)
    }

    pub fn set_local(&self, name: &str, value: Option<Value>) {
        self.runtime.variables().set_local(self.event, name, value);
    }

    /// Current value of the `level`-th enclosing `loop` (1 = innermost)
    pub fn loop_value(&self, level: usize) -> Option<Value> {
        let id = self.enclosing_loop(level, true)?;
        self.frame.loops.get(&id)?.current.clone()
    }

    /// Iteration counter of the `level`-th enclosing loop of any kind
    pub fn loop_iteration(&self, level: usize) -> Option<u64> {
        let id = self.enclosing_loop(level, false)?;
        self.frame.loops.get(&id).map(|state| state.iteration)
    }

    fn enclosing_loop(&self, level: usize, values_only: bool) -> Option<ItemId> {
        let graph = self.trigger.graph();
        let mut remaining = level;
        let mut at = graph.parent(self.current);
        while let Some(id) = at {
            let counts = match graph.section(id).map(|section| &section.kind) {
                Some(SectionKind::Loop(_)) => true,
                Some(SectionKind::While(_)) => !values_only,
                _ => false,
            };
            if counts {
                remaining = remaining.checked_sub(1)?;
                if remaining == 0 {
                    return Some(id);
                }
            }
            at = graph.parent(id);
        }
        None
    }

    /// Runs the exit handlers of the given sections, in order
    pub(crate) fn exit_sections(&mut self, sections: &[ItemId]) {
        let trigger = self.trigger;
        let graph = trigger.graph();
        for &id in sections {
            if let Some(handler) = graph.section(id).and_then(|section| section.exit_handler()) {
                handler.exit(self);
            }
        }
    }
}
