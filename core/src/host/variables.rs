//! Local variable storage
//!
//! Locals are scoped to one event. A delay takes them out of the store as a
//! [`Locals`] bundle and puts them back when the invocation resumes.

use crate::event::{Event, EventId};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// The locals of one event, detached from the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locals {
    values: HashMap<String, Value>,
}

impl Locals {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub trait VariableStore: Send + Sync {
    fn get_local(&self, event: &Event, name: &str) -> Option<Value>;

    /// `None` deletes the variable
    fn set_local(&self, event: &Event, name: &str, value: Option<Value>);

    /// Remove and return every local of `event`
    fn detach_locals(&self, event: &Event) -> Option<Locals>;

    fn attach_locals(&self, event: &Event, locals: Locals);

    fn clear_locals(&self, event: &Event);
}

/// In-process store keyed by event identity
#[derive(Default)]
pub struct MemoryVariableStore {
    locals: Mutex<HashMap<EventId, Locals>>,
}

impl MemoryVariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any local is bound for `event`
    pub fn has_locals(&self, event: &Event) -> bool {
        self.lock().contains_key(&event.id())
    }

    /// Number of events with bound locals
    pub fn events(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EventId, Locals>> {
        self.locals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VariableStore for MemoryVariableStore {
    fn get_local(&self, event: &Event, name: &str) -> Option<Value> {
        self.lock().get(&event.id())?.values.get(name).cloned()
    }

    fn set_local(&self, event: &Event, name: &str, value: Option<Value>) {
        let mut locals = self.lock();
        match value {
            Some(value) => {
                locals.entry(event.id()).or_default().values.insert(name.to_string(), value);
            }
            None => {
                if let Some(bundle) = locals.get_mut(&event.id()) {
                    bundle.values.remove(name);
                    if bundle.is_empty() {
                        locals.remove(&event.id());
                    }
                }
            }
        }
    }

    fn detach_locals(&self, event: &Event) -> Option<Locals> {
        self.lock().remove(&event.id())
    }

    fn attach_locals(&self, event: &Event, locals: Locals) {
        if !locals.is_empty() {
            self.lock().insert(event.id(), locals);
        }
    }

    fn clear_locals(&self, event: &Event) {
        self.lock().remove(&event.id());
    }
}
