//! Host schedulers
//!
//! The engine only needs "run this after N ticks". [`TickScheduler`] is driven
//! by hand, one tick at a time; [`TokioScheduler`] sleeps in real time and
//! funnels due tasks into a [`HostLoop`] that runs them one after another.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Deferred work, run on the host's primary context
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Run `task` once `ticks` ticks have passed
    fn schedule_after(&self, ticks: u64, task: Task);
}

/* ===================== Manual Ticks ===================== */

#[derive(Default)]
struct TickState {
    now: u64,
    seq: u64,
    queue: BTreeMap<(u64, u64), Task>,
}

/// Scheduler whose clock only moves when [`advance`](TickScheduler::advance) is called
#[derive(Default)]
pub struct TickScheduler {
    state: Mutex<TickState>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tick
    pub fn now(&self) -> u64 {
        self.lock().now
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Tick at which the earliest pending task is due
    pub fn next_due(&self) -> Option<u64> {
        self.lock().queue.keys().next().map(|(due, _)| *due)
    }

    /// Move the clock forward, running every task that falls due in order.
    /// Tasks scheduled by those tasks run too if they fall inside the window.
    /// Returns how many tasks ran.
    pub fn advance(&self, ticks: u64) -> usize {
        let target = self.now().saturating_add(ticks);
        let mut ran = 0;
        loop {
            let task = {
                let mut state = self.lock();
                match state.queue.first_key_value().map(|(key, _)| *key) {
                    Some((due, seq)) if due <= target => {
                        state.now = due;
                        state.queue.remove(&(due, seq))
                    }
                    _ => {
                        state.now = target;
                        None
                    }
                }
            };
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TickState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for TickScheduler {
    fn schedule_after(&self, ticks: u64, task: Task) {
        let mut state = self.lock();
        let due = state.now.saturating_add(ticks);
        let seq = state.seq;
        state.seq += 1;
        state.queue.insert((due, seq), task);
        trace!(target: "tripwire::scheduler", due, ticks, "task scheduled");
    }
}

/* ===================== Tokio ===================== */

/// Real-time scheduler. Sleeps on the tokio runtime and hands due tasks to the
/// [`HostLoop`], which is the only place they run.
pub struct TokioScheduler {
    tick: Duration,
    tx: mpsc::UnboundedSender<Task>,
    shutdown: CancellationToken,
    handle: tokio::runtime::Handle,
}

/// Receiving side of a [`TokioScheduler`]
pub struct HostLoop {
    rx: mpsc::UnboundedReceiver<Task>,
    shutdown: CancellationToken,
}

impl TokioScheduler {
    /// Must be called from within a tokio runtime
    pub fn new(tick: Duration) -> Result<(Self, HostLoop), tokio::runtime::TryCurrentError> {
        let handle = tokio::runtime::Handle::try_current()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let scheduler = TokioScheduler { tick, tx, shutdown: shutdown.clone(), handle };
        Ok((scheduler, HostLoop { rx, shutdown }))
    }

    /// Drop every sleeping task and stop the host loop
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, ticks: u64, task: Task) {
        let factor = u32::try_from(ticks).unwrap_or(u32::MAX);
        let delay = self.tick.saturating_mul(factor);
        let tx = self.tx.clone();
        let shutdown = self.shutdown.clone();
        self.handle.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // The loop is gone only after shutdown
                    let _ = tx.send(task);
                }
            }
        });
    }
}

impl HostLoop {
    /// Run due tasks until the scheduler shuts down
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                task = self.rx.recv() => match task {
                    Some(task) => task(),
                    None => break,
                },
            }
        }
    }
}
