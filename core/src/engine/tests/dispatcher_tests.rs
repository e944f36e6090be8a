//! Tests for routing events to triggers

use super::helpers::{ticks, Host, Journal};
use crate::elements::{CancelEvent, FnEffect, Literal};
use crate::engine::Script;
use crate::event::Event;
use crate::host::Dispatcher;
use crate::syntax::{Statement, TriggerBuilder};

#[test]
fn test_fire_runs_listeners_in_order() {
    let host = Host::new();
    let journal = Journal::new();
    let dispatcher = Dispatcher::new(host.runtime.clone());
    dispatcher.register(host.load(vec![journal.record("first")]));
    dispatcher.register(host.load(vec![journal.record("second")]));

    assert_eq!(dispatcher.listeners("test"), 2);
    assert_eq!(dispatcher.fire(&Event::new("test")), 2);
    assert_eq!(dispatcher.fire(&Event::new("other")), 0);
    assert_eq!(journal.entries(), vec!["first", "second"]);
}

#[test]
fn test_panicking_trigger_does_not_stop_others() {
    let host = Host::new();
    let journal = Journal::new();
    let dispatcher = Dispatcher::new(host.runtime.clone());
    dispatcher.register(host.load(vec![Statement::effect(FnEffect::new("explode", |_cx| panic!("boom")))]));
    dispatcher.register(host.load(vec![journal.record("survivor")]));

    assert_eq!(dispatcher.fire(&Event::new("test")), 2);
    assert_eq!(journal.entries(), vec!["survivor"]);
}

#[test]
fn test_unload_script_removes_triggers_and_abandons_continuations() {
    let host = Host::new();
    let journal = Journal::new();
    let dispatcher = Dispatcher::new(host.runtime.clone());
    dispatcher.register(host.load(vec![Statement::delay(Literal::new(ticks(1))), journal.record("resumed")]));

    let other = Script::new("other.sk");
    let kept = TriggerBuilder::new(&other, "on test (other.sk:1)", "test")
        .build(vec![journal.record("other")])
        .unwrap()
        .into_inner();
    dispatcher.register(kept);

    dispatcher.fire(&Event::new("test"));
    assert_eq!(host.scheduler.pending(), 1);

    assert_eq!(dispatcher.unload_script(&host.script), 1);
    assert_eq!(dispatcher.listeners("test"), 1);
    host.scheduler.advance(1);

    assert_eq!(journal.entries(), vec!["other"]);
}

#[test]
fn test_cancel_applies_before_delay() {
    let host = Host::new();
    let dispatcher = Dispatcher::new(host.runtime.clone());
    dispatcher.register(host.load(vec![Statement::effect(CancelEvent::cancel())]));

    let event = Event::new("test");
    dispatcher.fire(&event);
    assert!(event.is_cancelled());
}

#[tokio::test]
async fn test_tokio_host_resumes_delayed_trigger() {
    use crate::config::EngineConfig;
    use crate::host::{MemoryVariableStore, Runtime, TokioScheduler};
    use std::sync::Arc;
    use std::time::Duration;

    let (scheduler, host_loop) = TokioScheduler::new(Duration::from_millis(5)).unwrap();
    let scheduler = Arc::new(scheduler);
    let runtime = Runtime::new(
        scheduler.clone(),
        Arc::new(MemoryVariableStore::new()),
        EngineConfig { tick_millis: 5, max_steps: None },
    );
    let journal = Journal::new();
    let script = Script::new("tokio.sk");
    let trigger = TriggerBuilder::new(&script, "on test (tokio.sk:1)", "test")
        .tick_length(Duration::from_millis(5))
        .build(vec![Statement::delay(Literal::new(crate::value::Timespan::from_millis(10))), journal.record("resumed")])
        .unwrap()
        .into_inner();
    let dispatcher = Dispatcher::new(runtime.clone());
    dispatcher.register(trigger);

    let running = tokio::spawn(host_loop.run());
    dispatcher.fire(&Event::new("test"));

    tokio::time::timeout(Duration::from_secs(5), async {
        while journal.entries().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("continuation ran");

    scheduler.shutdown();
    running.await.unwrap();
    assert_eq!(journal.entries(), vec!["resumed"]);
}
