//! Tests for the trampoline and silent truncation

use super::helpers::{abort, always, Host, Journal};
use crate::config::EngineConfig;
use crate::elements::{FnEffect, IsSet, Literal, LocalVariable, Log, SetLocal};
use crate::errors::RuntimeError;
use crate::event::Event;
use crate::syntax::Statement;
use crate::value::Value;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting_chain(n: usize, counter: &Arc<AtomicUsize>) -> Vec<Statement> {
    (0..n)
        .map(|_| {
            let counter = Arc::clone(counter);
            Statement::effect(FnEffect::new("count", move |_cx| {
                counter.fetch_add(1, Ordering::Relaxed);
                ControlFlow::Continue(())
            }))
        })
        .collect()
}

#[test]
fn test_long_chain_runs_every_item_once() {
    // Far longer than any native stack could recurse through
    let n = 200_000;
    let host = Host::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let trigger = host.load(counting_chain(n, &counter));

    trigger.execute(&host.runtime, &Event::new("test")).unwrap();

    assert_eq!(counter.load(Ordering::Relaxed), n);
}

#[test]
fn test_walk_calls_equal_path_length() {
    // A step ceiling of exactly N lets an N-item chain finish; N - 1 does not
    let n = 1_000;
    let counter = Arc::new(AtomicUsize::new(0));

    let exact = Host::with_settings(EngineConfig { max_steps: Some(n as u64), ..EngineConfig::default() });
    let trigger = exact.load(counting_chain(n, &counter));
    assert!(trigger.execute(&exact.runtime, &Event::new("test")).is_ok());

    let short = Host::with_settings(EngineConfig { max_steps: Some(n as u64 - 1), ..EngineConfig::default() });
    let trigger = short.load(counting_chain(n, &counter));
    let err = trigger.execute(&short.runtime, &Event::new("test")).unwrap_err();
    assert!(matches!(err, RuntimeError::StepLimit { limit, .. } if limit == n as u64 - 1));
}

#[test]
fn test_empty_trigger() {
    let host = Host::new();
    let trigger = host.load(vec![]);
    assert_eq!(trigger.first(), None);
    assert!(trigger.execute(&host.runtime, &Event::new("test")).is_ok());
}

#[test]
fn test_missing_value_truncates_silently() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![
        journal.record("a"),
        // Logging an unset variable has nothing to say and stops the invocation
        Statement::effect(Log::new(Box::new(LocalVariable::new("unset")))),
        journal.record("c"),
    ]);

    let result = trigger.execute(&host.runtime, &Event::new("test"));

    assert!(result.is_ok());
    assert_eq!(journal.entries(), vec!["a"]);
}

#[test]
fn test_breaking_effect_stops_invocation() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![journal.record("a"), abort(), journal.record("c")]);

    assert!(trigger.execute(&host.runtime, &Event::new("test")).is_ok());
    assert_eq!(journal.entries(), vec!["a"]);
}

#[test]
fn test_failed_top_level_condition_ends_invocation() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![
        journal.record("a"),
        Statement::condition(IsSet::new(Box::new(LocalVariable::new("unset")))),
        journal.record("b"),
    ]);

    trigger.execute(&host.runtime, &Event::new("test")).unwrap();
    assert_eq!(journal.entries(), vec!["a"]);
}

#[test]
fn test_guarded_effect() {
    let host = Host::new();
    let journal = Journal::new();
    let guarded = |result: bool, label: &str| {
        let journal = journal.clone();
        let label = label.to_string();
        Statement::Guarded {
            guard: Box::new(always(result)),
            effect: Box::new(FnEffect::new("guarded", move |_cx| {
                journal.push(label.clone());
                ControlFlow::Continue(())
            })),
        }
    };
    let trigger = host.load(vec![guarded(false, "skipped"), guarded(true, "ran"), journal.record("end")]);

    trigger.execute(&host.runtime, &Event::new("test")).unwrap();
    assert_eq!(journal.entries(), vec!["ran", "end"]);
}

#[test]
fn test_locals_cleared_after_synchronous_run() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![
        Statement::effect(SetLocal::new("x", Box::new(Literal::new(5.0)))),
        journal.record_local("x", "x"),
    ]);
    let event = Event::new("test");

    trigger.execute(&host.runtime, &event).unwrap();

    assert_eq!(journal.entries(), vec!["x=5"]);
    assert!(!host.variables.has_locals(&event));
}

#[test]
fn test_panicking_effect_is_contained() {
    let host = Host::new();
    let trigger = host.load(vec![Statement::effect(FnEffect::new("explode", |_cx| panic!("boom")))]);

    let err = trigger.execute(&host.runtime, &Event::new("test")).unwrap_err();
    assert!(matches!(err, RuntimeError::Panicked { ref message, .. } if message == "boom"));
}

#[test]
fn test_event_values_reach_effects() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![
        Statement::effect(SetLocal::new("who", Box::new(crate::elements::EventValue::new("player")))),
        journal.record_local("who", "who"),
    ]);
    let event = Event::with_values("test", maplit::hashmap! { "player".to_string() => Value::from("alex") });

    trigger.execute(&host.runtime, &event).unwrap();
    assert_eq!(journal.entries(), vec!["who=alex"]);
}
