//! Triggers and the scripts that own them

use super::context::Frame;
use super::item::{ItemGraph, ItemId};
use super::walk::trampoline;
use crate::errors::RuntimeError;
use crate::event::Event;
use crate::host::Runtime;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug_span;
use uuid::Uuid;

/// A loaded script. Unloading it stops pending continuations of its triggers.
#[derive(Debug)]
pub struct Script {
    id: Uuid,
    name: String,
    loaded: AtomicBool,
}

impl Script {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Script {
            id: Uuid::new_v4(),
            name: name.into(),
            loaded: AtomicBool::new(true),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub fn unload(&self) {
        self.loaded.store(false, Ordering::Release);
    }
}

struct TriggerShared {
    label: String,
    event_name: String,
    script: Arc<Script>,
    graph: ItemGraph,
    first: Option<ItemId>,
}

/// One compiled handler for one kind of event. Cheap to clone.
#[derive(Clone)]
pub struct Trigger {
    shared: Arc<TriggerShared>,
}

impl Trigger {
    pub(crate) fn new(
        label: String,
        event_name: String,
        script: Arc<Script>,
        graph: ItemGraph,
        first: Option<ItemId>,
    ) -> Self {
        Trigger {
            shared: Arc::new(TriggerShared { label, event_name, script, graph, first }),
        }
    }

    /// Debug label, e.g. `on join (greetings.sk:3)`
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    pub fn event_name(&self) -> &str {
        &self.shared.event_name
    }

    pub fn script(&self) -> &Arc<Script> {
        &self.shared.script
    }

    pub fn graph(&self) -> &ItemGraph {
        &self.shared.graph
    }

    pub fn first(&self) -> Option<ItemId> {
        self.shared.first
    }

    /// Run this trigger for `event`.
    ///
    /// Returns once the invocation finishes or suspends. Missing values end the
    /// invocation quietly; only internal failures come back as errors.
    pub fn execute(&self, runtime: &Runtime, event: &Event) -> Result<(), RuntimeError> {
        self.run(runtime, event, &mut Frame::new())
    }

    /// Like [`execute`](Self::execute) with a caller-owned frame
    pub(crate) fn run(&self, runtime: &Runtime, event: &Event, frame: &mut Frame) -> Result<(), RuntimeError> {
        let result = match self.first() {
            Some(first) => self.walk_from(first, runtime, event, frame),
            None => Ok(()),
        };
        // A delayed invocation has already detached its locals, so this only
        // drops bindings of invocations that finished synchronously.
        runtime.variables().clear_locals(event);
        result
    }

    pub(crate) fn walk_from(
        &self,
        start: ItemId,
        runtime: &Runtime,
        event: &Event,
        frame: &mut Frame,
    ) -> Result<(), RuntimeError> {
        let span = debug_span!("trigger", label = self.label(), invocation = %frame.invocation, event = %event.id());
        let _enter = span.enter();

        catch_unwind(AssertUnwindSafe(|| trampoline(start, self, runtime, event, frame))).unwrap_or_else(
            |payload| {
                Err(RuntimeError::Panicked {
                    label: self.label().to_string(),
                    message: panic_message(payload.as_ref()),
                })
            },
        )
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("label", &self.shared.label)
            .field("event", &self.shared.event_name)
            .field("items", &self.shared.graph.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
