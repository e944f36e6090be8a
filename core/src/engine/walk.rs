//! The trampoline
//!
//! Every item's `walk` does one step and returns the next item. The driver loops
//! until an item returns `None`, so arbitrarily long or deeply nested triggers
//! never grow the native stack.

use super::context::{Context, Frame};
use super::item::{EffectItem, ItemId, ItemKind, TriggerItem};
use super::trigger::Trigger;
use crate::errors::RuntimeError;
use crate::event::Event;
use crate::host::Runtime;
use std::ops::ControlFlow;
use tracing::{debug, trace};

/* ===================== Driver ===================== */

/// Walk `trigger` from `start` until an item ends the invocation
pub(crate) fn trampoline(
    start: ItemId,
    trigger: &Trigger,
    runtime: &Runtime,
    event: &Event,
    frame: &mut Frame,
) -> Result<(), RuntimeError> {
    let graph = trigger.graph();
    let limit = runtime.settings().max_steps;
    let mut steps: u64 = 0;
    let mut current = Some(start);

    while let Some(id) = current {
        let item = graph.get(id).ok_or_else(|| RuntimeError::DanglingItem {
            label: trigger.label().to_string(),
            item: id,
        })?;

        steps += 1;
        if let Some(limit) = limit {
            if steps > limit {
                return Err(RuntimeError::StepLimit { label: trigger.label().to_string(), limit });
            }
        }

        trace!(
            target: "tripwire::walk",
            invocation = %frame.invocation,
            "{:indent$}{item}",
            "",
            indent = item.depth * 4
        );

        let mut cx = Context { event, runtime, trigger, frame: &mut *frame, current: id };
        current = item.walk(&mut cx);
    }
    Ok(())
}

/* ===================== Single Step ===================== */

impl TriggerItem {
    /// Execute this item once and return the item to run next
    pub(crate) fn walk(&self, cx: &mut Context<'_>) -> Option<ItemId> {
        match &self.kind {
            ItemKind::Effect(effect) => self.walk_effect(effect, cx),
            ItemKind::Condition(condition) => {
                if condition.check(cx) {
                    self.next
                } else {
                    cx.trigger.graph().continuation_of(self.parent)
                }
            }
            ItemKind::Section(section) => section.walk(self, cx),
        }
    }

    fn walk_effect(&self, effect: &EffectItem, cx: &mut Context<'_>) -> Option<ItemId> {
        match effect {
            EffectItem::Host(effect) => match effect.execute(cx) {
                ControlFlow::Continue(()) => self.next,
                ControlFlow::Break(()) => {
                    debug!(target: "tripwire::walk", invocation = %cx.frame.invocation, item = %cx.current, "effect stopped the invocation");
                    None
                }
            },
            EffectItem::Guarded { guard, effect } => {
                if guard.check(cx) {
                    Some(*effect)
                } else {
                    self.next
                }
            }
            EffectItem::Delay(delay) => delay.walk(self, cx),
            EffectItem::Await(wait) => wait.walk(self, cx),
            EffectItem::Continue(jump) => jump.walk(cx),
            EffectItem::Exit(jump) => jump.walk(cx),
            EffectItem::Return(ret) => ret.walk(cx),
        }
    }
}
