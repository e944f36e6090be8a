use super::{Effect, Expression};
use crate::engine::Context;
use crate::syntax::{Kleenean, LoadContext};
use std::fmt;
use std::ops::ControlFlow;
use tracing::{debug, info};

/// `set {_name} to <value>`; an empty value deletes the variable
#[derive(Debug)]
pub struct SetLocal {
    name: String,
    value: Box<dyn Expression>,
}

impl SetLocal {
    pub fn new(name: impl Into<String>, value: Box<dyn Expression>) -> Self {
        SetLocal { name: name.into(), value }
    }
}

impl Effect for SetLocal {
    fn execute(&self, cx: &mut Context<'_>) -> ControlFlow<()> {
        let value = self.value.single(cx);
        cx.set_local(&self.name, value);
        ControlFlow::Continue(())
    }
}

/// Writes a message to the script log. Truncates when the message is absent.
#[derive(Debug)]
pub struct Log {
    message: Box<dyn Expression>,
}

impl Log {
    pub fn new(message: Box<dyn Expression>) -> Self {
        Log { message }
    }
}

impl Effect for Log {
    fn execute(&self, cx: &mut Context<'_>) -> ControlFlow<()> {
        let values = self.message.values(cx);
        if values.is_empty() {
            return ControlFlow::Break(());
        }
        let text = values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        info!(target: "tripwire::script", event = %cx.event().id(), "{text}");
        ControlFlow::Continue(())
    }
}

/// Cancels (or uncancels) the event. Only meaningful while the host is still
/// handling the event synchronously.
#[derive(Debug)]
pub struct CancelEvent {
    cancel: bool,
}

impl CancelEvent {
    pub fn cancel() -> Self {
        CancelEvent { cancel: true }
    }

    pub fn uncancel() -> Self {
        CancelEvent { cancel: false }
    }
}

impl Effect for CancelEvent {
    fn execute(&self, cx: &mut Context<'_>) -> ControlFlow<()> {
        if cx.is_delayed() {
            debug!(target: "tripwire::walk", event = %cx.event().id(), "event already passed, cancel ignored");
            return ControlFlow::Continue(());
        }
        cx.event().set_cancelled(self.cancel);
        ControlFlow::Continue(())
    }

    fn on_load(&mut self, cx: &mut LoadContext<'_>) -> Result<(), String> {
        match cx.has_delay_before() {
            Kleenean::True => Err("Can't cancel the event anymore after it has already passed".to_string()),
            Kleenean::Unknown => {
                cx.warn("The event may already have passed here, in which case cancelling it does nothing");
                Ok(())
            }
            Kleenean::False => Ok(()),
        }
    }
}

type EffectFn = dyn Fn(&mut Context<'_>) -> ControlFlow<()> + Send + Sync;

/// An effect backed by a closure, for hosts that register effects in code
pub struct FnEffect {
    label: String,
    run: Box<EffectFn>,
}

impl FnEffect {
    pub fn new<F>(label: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> ControlFlow<()> + Send + Sync + 'static,
    {
        FnEffect { label: label.into(), run: Box::new(run) }
    }
}

impl fmt::Debug for FnEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

impl Effect for FnEffect {
    fn execute(&self, cx: &mut Context<'_>) -> ControlFlow<()> {
        (self.run)(cx)
    }
}
