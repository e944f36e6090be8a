//! Tests for delays, awaits and resumption

use super::helpers::{ticks, Host, Journal, Parked};
use crate::elements::{Literal, LocalVariable, SetLocal};
use crate::event::Event;
use crate::syntax::Statement;
use crate::value::{Timespan, Value};

fn set(name: &str, value: impl Into<Value>) -> Statement {
    Statement::effect(SetLocal::new(name, Box::new(Literal::new(value))))
}

fn wait(span: Timespan) -> Statement {
    Statement::delay(Literal::new(span))
}

#[test]
fn test_locals_survive_delay() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![set("x", 5.0), wait(ticks(1)), journal.record_local("after", "x")]);
    let event = Event::new("test");

    trigger.execute(&host.runtime, &event).unwrap();

    // Suspended: nothing after the delay ran and the locals are held by the continuation
    assert!(journal.entries().is_empty());
    assert!(!host.variables.has_locals(&event));
    assert_eq!(host.scheduler.pending(), 1);

    assert_eq!(host.scheduler.advance(1), 1);
    assert_eq!(journal.entries(), vec!["after=5"]);
    assert!(!host.variables.has_locals(&event));
}

#[test]
fn test_delayed_marker_visibility() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![
        journal.record_delayed("first"),
        journal.record_delayed("second"),
        wait(ticks(1)),
        journal.record_delayed("third"),
        wait(ticks(2)),
        journal.record_delayed("fourth"),
    ]);
    let event = Event::new("test");

    trigger.execute(&host.runtime, &event).unwrap();
    assert_eq!(journal.entries(), vec!["first:false", "second:false"]);
    assert!(!host.runtime.is_delayed(&event));

    host.scheduler.advance(1);
    assert!(host.runtime.is_delayed(&event));
    host.scheduler.advance(2);
    assert_eq!(
        journal.entries(),
        vec!["first:false", "second:false", "third:true", "fourth:true"]
    );
}

#[test]
fn test_sub_tick_delays_wait_one_tick() {
    for span in [Timespan::from_millis(0), Timespan::from_millis(10), Timespan::from_millis(49)] {
        let host = Host::new();
        let journal = Journal::new();
        let trigger = host.load(vec![wait(span), journal.record("after")]);

        trigger.execute(&host.runtime, &Event::new("test")).unwrap();

        assert_eq!(host.scheduler.next_due(), Some(1), "delay of {span}");
        assert_eq!(host.scheduler.advance(0), 0);
        assert!(journal.entries().is_empty());
        assert_eq!(host.scheduler.advance(1), 1);
        assert_eq!(journal.entries(), vec!["after"]);
    }
}

#[test]
fn test_delay_waits_requested_ticks() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![wait(ticks(7)), journal.record("after")]);

    trigger.execute(&host.runtime, &Event::new("test")).unwrap();

    assert_eq!(host.scheduler.advance(6), 0);
    assert!(journal.entries().is_empty());
    assert_eq!(host.scheduler.advance(1), 1);
    assert_eq!(journal.entries(), vec!["after"]);
}

#[test]
fn test_unresolved_duration_truncates() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![
        journal.record("before"),
        Statement::delay(LocalVariable::new("missing")),
        journal.record("after"),
    ]);
    let event = Event::new("test");

    assert!(trigger.execute(&host.runtime, &event).is_ok());
    assert_eq!(host.scheduler.pending(), 0);
    assert_eq!(journal.entries(), vec!["before"]);
}

#[test]
fn test_dynamic_infinite_duration_truncates() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![
        set("forever", Timespan::Infinite),
        Statement::delay(LocalVariable::new("forever")),
        journal.record("after"),
    ]);

    trigger.execute(&host.runtime, &Event::new("test")).unwrap();
    assert_eq!(host.scheduler.pending(), 0);
    assert!(journal.entries().is_empty());
}

#[test]
fn test_trailing_delay_schedules_nothing() {
    let host = Host::new();
    let trigger = host.load(vec![wait(ticks(1))]);

    trigger.execute(&host.runtime, &Event::new("test")).unwrap();
    assert_eq!(host.scheduler.pending(), 0);
}

#[test]
fn test_no_delay_during_shutdown() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![wait(ticks(1)), journal.record("after")]);

    host.runtime.shutdown();
    trigger.execute(&host.runtime, &Event::new("test")).unwrap();
    assert_eq!(host.scheduler.pending(), 0);
}

#[test]
fn test_continuation_aborts_after_shutdown() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![set("x", 1.0), wait(ticks(1)), journal.record("after")]);
    let event = Event::new("test");

    trigger.execute(&host.runtime, &event).unwrap();
    host.runtime.shutdown();
    assert_eq!(host.scheduler.advance(1), 1);

    assert!(journal.entries().is_empty());
    assert!(!host.runtime.is_delayed(&event));
    assert!(!host.variables.has_locals(&event));
}

#[test]
fn test_continuation_aborts_after_unload() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![wait(ticks(1)), journal.record("after")]);

    trigger.execute(&host.runtime, &Event::new("test")).unwrap();
    host.script.unload();
    host.scheduler.advance(1);

    assert!(journal.entries().is_empty());
}

#[test]
fn test_interleaved_invocations_keep_their_locals() {
    let host = Host::new();
    let journal = Journal::new();
    let trigger = host.load(vec![
        Statement::effect(SetLocal::new("who", Box::new(crate::elements::EventValue::new("player")))),
        wait(ticks(1)),
        journal.record_local("resumed", "who"),
    ]);
    let alex = Event::with_values("test", maplit::hashmap! { "player".to_string() => Value::from("alex") });
    let sam = Event::with_values("test", maplit::hashmap! { "player".to_string() => Value::from("sam") });

    trigger.execute(&host.runtime, &alex).unwrap();
    trigger.execute(&host.runtime, &sam).unwrap();
    host.scheduler.advance(1);

    assert_eq!(journal.entries(), vec!["resumed=alex", "resumed=sam"]);
    assert_eq!(host.variables.events(), 0);
}

#[test]
fn test_await_resumes_with_locals() {
    let host = Host::new();
    let journal = Journal::new();
    let operation = Parked::default();
    let trigger = host.load(vec![
        set("x", 5.0),
        Statement::Await(Box::new(operation.clone())),
        journal.record_local("after", "x"),
        journal.record_delayed("after"),
    ]);
    let event = Event::new("test");

    trigger.execute(&host.runtime, &event).unwrap();
    assert!(operation.is_parked());
    assert!(!host.variables.has_locals(&event));
    assert!(journal.entries().is_empty());

    operation.take().unwrap().resume();
    assert_eq!(journal.entries(), vec!["after=5", "after:true"]);
    assert!(!host.variables.has_locals(&event));
}

#[test]
fn test_await_resume_next_tick() {
    let host = Host::new();
    let journal = Journal::new();
    let operation = Parked::default();
    let trigger = host.load(vec![Statement::Await(Box::new(operation.clone())), journal.record("after")]);

    trigger.execute(&host.runtime, &Event::new("test")).unwrap();
    operation.take().unwrap().resume_next_tick();

    assert!(journal.entries().is_empty());
    assert_eq!(host.scheduler.advance(1), 1);
    assert_eq!(journal.entries(), vec!["after"]);
}

#[test]
fn test_dropped_resume_abandons_invocation() {
    let host = Host::new();
    let journal = Journal::new();
    let operation = Parked::default();
    let trigger = host.load(vec![set("x", 1.0), Statement::Await(Box::new(operation.clone())), journal.record("after")]);
    let event = Event::new("test");

    trigger.execute(&host.runtime, &event).unwrap();
    drop(operation.take());

    assert!(journal.entries().is_empty());
    assert!(!host.variables.has_locals(&event));
}
