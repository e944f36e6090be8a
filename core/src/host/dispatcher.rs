//! Routes host events to the triggers listening for them

use super::runtime::Runtime;
use crate::engine::{Script, Trigger};
use crate::event::Event;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, error, info};

pub struct Dispatcher {
    runtime: Runtime,
    triggers: RwLock<HashMap<String, Vec<Trigger>>>,
}

impl Dispatcher {
    pub fn new(runtime: Runtime) -> Self {
        Dispatcher { runtime, triggers: RwLock::new(HashMap::new()) }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn register(&self, trigger: Trigger) {
        debug!(target: "tripwire::host", trigger = trigger.label(), event = trigger.event_name(), "trigger registered");
        let mut triggers = self.triggers.write().unwrap_or_else(PoisonError::into_inner);
        triggers.entry(trigger.event_name().to_string()).or_default().push(trigger);
    }

    /// Triggers currently listening for `event_name`
    pub fn listeners(&self, event_name: &str) -> usize {
        let triggers = self.triggers.read().unwrap_or_else(PoisonError::into_inner);
        triggers.get(event_name).map_or(0, Vec::len)
    }

    /// Run every trigger registered for this event, in registration order.
    /// Returns how many ran. Failures are logged, never propagated.
    pub fn fire(&self, event: &Event) -> usize {
        let listeners: Vec<Trigger> = {
            let triggers = self.triggers.read().unwrap_or_else(PoisonError::into_inner);
            triggers.get(event.name()).cloned().unwrap_or_default()
        };
        for trigger in &listeners {
            if let Err(err) = trigger.execute(&self.runtime, event) {
                error!(target: "tripwire::host", event = %event.id(), "{err}");
            }
        }
        listeners.len()
    }

    /// Mark `script` unloaded and drop its triggers. Returns how many were removed.
    pub fn unload_script(&self, script: &Script) -> usize {
        script.unload();
        let mut triggers = self.triggers.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;
        for list in triggers.values_mut() {
            let before = list.len();
            list.retain(|trigger| trigger.script().id() != script.id());
            removed += before - list.len();
        }
        triggers.retain(|_, list| !list.is_empty());
        info!(target: "tripwire::host", script = script.name(), removed, "script unloaded");
        removed
    }
}
