//! Suspending an invocation and resuming it later
//!
//! A delay detaches the event's locals, moves the invocation's [`Frame`] into a
//! one-shot [`Continuation`] and hands that to the host scheduler. The walk then
//! ends as if the trigger had finished. When the scheduler fires, the
//! continuation marks the event as delayed, reattaches the locals, walks on from
//! the captured item and finally clears the locals again.

use super::context::{Context, Frame};
use super::item::{ItemId, TriggerItem};
use super::trigger::Trigger;
use crate::elements::{AsyncOperation, Expression};
use crate::event::{Event, EventId, EventInner};
use crate::host::{Locals, Runtime};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, Weak};
use tracing::{debug, error};

/// `wait <duration>`
#[derive(Debug)]
pub struct Delay {
    pub(crate) duration: Box<dyn Expression>,
}

impl Delay {
    pub(crate) fn walk(&self, item: &TriggerItem, cx: &mut Context<'_>) -> Option<ItemId> {
        let Some(next) = item.next else {
            debug!(target: "tripwire::walk", invocation = %cx.frame.invocation, "delay is the last item, nothing to resume");
            return None;
        };
        if !cx.runtime.is_enabled() {
            debug!(target: "tripwire::walk", invocation = %cx.frame.invocation, "host is shutting down, delay dropped");
            return None;
        }

        let Some(span) = self.duration.single(cx).and_then(|value| value.as_timespan()) else {
            debug!(target: "tripwire::walk", invocation = %cx.frame.invocation, "delay duration did not resolve");
            return None;
        };
        let Some(ticks) = span.as_ticks(cx.runtime.tick()) else {
            debug!(target: "tripwire::walk", invocation = %cx.frame.invocation, "infinite delay, invocation ends");
            return None;
        };

        let continuation = Continuation::capture(cx, next);
        cx.runtime
            .scheduler()
            .schedule_after(ticks.max(1), Box::new(move || continuation.resume()));
        None
    }
}

/// Waits for a host operation of unknown length
#[derive(Debug)]
pub struct Await {
    pub(crate) operation: Box<dyn AsyncOperation>,
}

impl Await {
    pub(crate) fn walk(&self, item: &TriggerItem, cx: &mut Context<'_>) -> Option<ItemId> {
        let Some(next) = item.next else {
            debug!(target: "tripwire::walk", invocation = %cx.frame.invocation, "await is the last item, nothing to resume");
            return None;
        };
        if !cx.runtime.is_enabled() {
            debug!(target: "tripwire::walk", invocation = %cx.frame.invocation, "host is shutting down, await dropped");
            return None;
        }

        let Some(pending) = self.operation.begin(cx) else {
            debug!(target: "tripwire::walk", invocation = %cx.frame.invocation, "async operation did not start");
            return None;
        };
        let continuation = Continuation::capture(cx, next);
        pending(Resume { continuation });
        None
    }
}

/// A suspended invocation. Runs at most once.
pub(crate) struct Continuation {
    trigger: Trigger,
    runtime: Runtime,
    event: Event,
    frame: Frame,
    resume_at: ItemId,
    locals: Option<Locals>,
}

impl Continuation {
    /// Detaches locals and takes the frame; `cx` is left with a fresh frame
    fn capture(cx: &mut Context<'_>, resume_at: ItemId) -> Self {
        let locals = cx.runtime.variables().detach_locals(cx.event);
        Continuation {
            trigger: cx.trigger.clone(),
            runtime: cx.runtime.clone(),
            event: cx.event.clone(),
            frame: std::mem::take(cx.frame),
            resume_at,
            locals,
        }
    }

    pub(crate) fn resume(mut self) {
        let invocation = self.frame.invocation;
        if !self.runtime.is_enabled() {
            debug!(target: "tripwire::walk", %invocation, trigger = self.trigger.label(), "host disabled, continuation abandoned");
            return;
        }
        if !self.trigger.script().is_loaded() {
            debug!(target: "tripwire::walk", %invocation, trigger = self.trigger.label(), "script unloaded, continuation abandoned");
            return;
        }

        self.runtime.mark_delayed(&self.event);
        if let Some(locals) = self.locals.take() {
            self.runtime.variables().attach_locals(&self.event, locals);
        }

        let result = self
            .trigger
            .walk_from(self.resume_at, &self.runtime, &self.event, &mut self.frame);
        self.runtime.variables().clear_locals(&self.event);

        if let Err(err) = result {
            error!(target: "tripwire::walk", %invocation, "{err}");
        }
    }
}

/// Handle given to an [`AsyncOperation`] to continue the invocation
pub struct Resume {
    continuation: Continuation,
}

impl Resume {
    /// Continue right away. Call from the host's primary context.
    pub fn resume(self) {
        self.continuation.resume();
    }

    /// Continue on the next tick of the host scheduler
    pub fn resume_next_tick(self) {
        let scheduler = self.continuation.runtime.scheduler();
        let continuation = self.continuation;
        scheduler.schedule_after(1, Box::new(move || continuation.resume()));
    }
}

/// Smallest size at which dead entries are swept
const PRUNE_FLOOR: usize = 64;

/// Events whose remaining execution happens after at least one delay.
///
/// Entries hold the event weakly. Dead entries are swept once the map has
/// doubled since the last sweep, so marking stays amortized O(1).
#[derive(Default)]
pub struct DelayedEvents {
    state: Mutex<DelayedState>,
}

#[derive(Default)]
struct DelayedState {
    entries: HashMap<EventId, Weak<EventInner>>,
    prune_at: usize,
}

impl DelayedEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_delayed(&self, event: &Event) -> bool {
        let state = self.lock();
        state
            .entries
            .get(&event.id())
            .is_some_and(|entry| entry.strong_count() > 0)
    }

    pub fn mark_delayed(&self, event: &Event) {
        let mut state = self.lock();
        if state.entries.len() >= state.prune_at.max(PRUNE_FLOOR) {
            state.entries.retain(|_, entry| entry.strong_count() > 0);
            state.prune_at = state.entries.len() * 2;
        }
        state.entries.insert(event.id(), event.downgrade());
    }

    /// Marked events that are still alive
    pub fn live(&self) -> usize {
        self.lock().entries.values().filter(|entry| entry.strong_count() > 0).count()
    }

    /// Entries held, dead ones included
    pub(crate) fn tracked(&self) -> usize {
        self.lock().entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DelayedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
