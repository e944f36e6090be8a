//! Host events
//!
//! An [`Event`] is one occurrence of something happening in the host. Events are
//! compared by identity: two events built from identical data are still different
//! events, and clones of one event are the same event.

use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct EventInner {
    id: EventId,
    name: String,
    values: HashMap<String, Value>,
    cancelled: AtomicBool,
}

/// Cheaply clonable handle to one host event
#[derive(Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_values(name, HashMap::new())
    }

    /// An event carrying named values (the player, the message, ...)
    pub fn with_values(name: impl Into<String>, values: HashMap<String, Value>) -> Self {
        Event {
            inner: Arc::new(EventInner {
                id: EventId(NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed)),
                name: name.into(),
                values,
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> EventId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.inner.values.get(key)
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    pub fn set_cancelled(&self, cancelled: bool) {
        self.inner.cancelled.store(cancelled, Ordering::Release);
    }

    pub(crate) fn downgrade(&self) -> Weak<EventInner> {
        Arc::downgrade(&self.inner)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    #[test]
    fn test_identity_equality() {
        let a = Event::new("join");
        let b = Event::new("join");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_values_and_cancellation() {
        let event = Event::with_values("chat", hashmap! { "message".to_string() => Value::from("hi") });
        assert_eq!(event.value("message"), Some(&Value::from("hi")));
        assert_eq!(event.value("player"), None);

        let clone = event.clone();
        clone.set_cancelled(true);
        assert!(event.is_cancelled());
    }
}
