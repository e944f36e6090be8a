//! Test helpers for engine tests
//!
//! A deterministic host (manual ticks, in-memory locals) and a journal that
//! effects write to, so tests can assert what ran and in which order.

use crate::config::EngineConfig;
use crate::elements::{AsyncOperation, Expression, FnCondition, FnEffect, Pending};
use crate::engine::{Context, ItemId, Resume, Script, Trigger};
use crate::errors::LoadError;
use crate::host::{MemoryVariableStore, Runtime, TickScheduler};
use crate::syntax::{Loaded, Statement, TriggerBuilder};
use crate::value::{Timespan, Value};
use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};

pub struct Host {
    pub scheduler: Arc<TickScheduler>,
    pub variables: Arc<MemoryVariableStore>,
    pub runtime: Runtime,
    pub script: Arc<Script>,
}

impl Host {
    pub fn new() -> Self {
        Self::with_settings(EngineConfig::default())
    }

    pub fn with_settings(settings: EngineConfig) -> Self {
        let scheduler = Arc::new(TickScheduler::new());
        let variables = Arc::new(MemoryVariableStore::new());
        let runtime = Runtime::new(scheduler.clone(), variables.clone(), settings);
        Host { scheduler, variables, runtime, script: Script::new("test.sk") }
    }

    pub fn try_load(&self, statements: Vec<Statement>) -> Result<Loaded<Trigger>, LoadError> {
        TriggerBuilder::new(&self.script, "on test (test.sk:1)", "test").build(statements)
    }

    pub fn load(&self, statements: Vec<Statement>) -> Trigger {
        self.try_load(statements).expect("trigger loads").into_inner()
    }
}

/// Shared log written by test effects
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    /// Effect that records `label`
    pub fn record(&self, label: &str) -> Statement {
        let journal = self.clone();
        let entry = label.to_string();
        Statement::effect(FnEffect::new(format!("record {label}"), move |_cx| {
            journal.push(entry.clone());
            ControlFlow::Continue(())
        }))
    }

    /// Effect that records `label:<is delayed>`
    pub fn record_delayed(&self, label: &str) -> Statement {
        let journal = self.clone();
        let label = label.to_string();
        Statement::effect(FnEffect::new(format!("record delayed {label}"), move |cx| {
            journal.push(format!("{label}:{}", cx.is_delayed()));
            ControlFlow::Continue(())
        }))
    }

    /// Effect that records `label=<local value or none>`
    pub fn record_local(&self, label: &str, name: &str) -> Statement {
        let journal = self.clone();
        let label = label.to_string();
        let name = name.to_string();
        Statement::effect(FnEffect::new(format!("record {{_{name}}}"), move |cx| {
            let value = cx.local(&name).map_or("none".to_string(), |v| v.to_string());
            journal.push(format!("{label}={value}"));
            ControlFlow::Continue(())
        }))
    }

    /// Effect that records the values of the enclosing loops, outermost first
    pub fn record_loops(&self, depth: usize) -> Statement {
        let journal = self.clone();
        Statement::effect(FnEffect::new("record loop values", move |cx| {
            let values: String = (1..=depth)
                .rev()
                .map(|level| cx.loop_value(level).map_or("-".to_string(), |v| v.to_string()))
                .collect();
            journal.push(values);
            ControlFlow::Continue(())
        }))
    }
}

/// Effect that abandons the invocation
pub fn abort() -> Statement {
    Statement::effect(FnEffect::new("abort", |_cx| ControlFlow::Break(())))
}

pub fn always(result: bool) -> FnCondition {
    FnCondition::new(format!("{result}"), move |_cx| result)
}

pub fn expr(expression: impl Expression + 'static) -> Box<dyn Expression> {
    Box::new(expression)
}

pub fn ticks(n: u64) -> Timespan {
    Timespan::from_millis(n * 50)
}

pub fn texts(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

/// Loop sections of a trigger, outermost first
pub fn loop_ids(trigger: &Trigger) -> Vec<ItemId> {
    let graph = trigger.graph();
    graph
        .ids()
        .filter(|id| graph.section(*id).is_some_and(|section| section.is_loop()))
        .collect()
}

/// Async operation that parks its resume handle for the test to fire
#[derive(Clone, Default)]
pub struct Parked {
    slot: Arc<Mutex<Option<Resume>>>,
}

impl Parked {
    pub fn take(&self) -> Option<Resume> {
        self.slot.lock().unwrap().take()
    }

    pub fn is_parked(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }
}

impl fmt::Debug for Parked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("parked operation")
    }
}

impl AsyncOperation for Parked {
    fn begin(&self, _cx: &mut Context<'_>) -> Option<Pending> {
        let slot = Arc::clone(&self.slot);
        Some(Box::new(move |resume| {
            *slot.lock().unwrap() = Some(resume);
        }))
    }
}
