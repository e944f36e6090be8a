use super::scheduler::Scheduler;
use super::variables::VariableStore;
use crate::config::EngineConfig;
use crate::engine::DelayedEvents;
use crate::event::Event;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

struct RuntimeInner {
    scheduler: Arc<dyn Scheduler>,
    variables: Arc<dyn VariableStore>,
    delayed: DelayedEvents,
    enabled: AtomicBool,
    settings: EngineConfig,
}

/// Everything a running trigger needs from the host. Cheap to clone.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    pub fn new(
        scheduler: Arc<dyn Scheduler>,
        variables: Arc<dyn VariableStore>,
        settings: EngineConfig,
    ) -> Self {
        Runtime {
            inner: Arc::new(RuntimeInner {
                scheduler,
                variables,
                delayed: DelayedEvents::new(),
                enabled: AtomicBool::new(true),
                settings,
            }),
        }
    }

    pub fn scheduler(&self) -> Arc<dyn Scheduler> {
        Arc::clone(&self.inner.scheduler)
    }

    pub fn variables(&self) -> &dyn VariableStore {
        self.inner.variables.as_ref()
    }

    pub fn settings(&self) -> &EngineConfig {
        &self.inner.settings
    }

    /// Length of one host tick
    pub fn tick(&self) -> Duration {
        self.inner.settings.tick()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    /// Stop scheduling delays; pending continuations abort when they fire
    pub fn shutdown(&self) {
        if self.inner.enabled.swap(false, Ordering::AcqRel) {
            info!(target: "tripwire::host", "runtime shutting down");
        }
    }

    pub fn is_delayed(&self, event: &Event) -> bool {
        self.inner.delayed.is_delayed(event)
    }

    pub fn mark_delayed(&self, event: &Event) {
        self.inner.delayed.mark_delayed(event);
    }

    pub fn delayed(&self) -> &DelayedEvents {
        &self.inner.delayed
    }
}
