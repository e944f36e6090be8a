//! # Trigger Execution Engine
//!
//! Runs compiled triggers against host events.
//!
//! ## Core Principles
//!
//! 1. **Trampoline, no recursion**: each item does one step and returns the next item
//! 2. **Arena graph**: items refer to each other by [`ItemId`], jump targets are resolved at load time
//! 3. **Closed node set**: every item is an effect, a condition or a section ([`ItemKind`])
//! 4. **Explicit continuations**: a delay moves the invocation's [`Frame`] and detached locals
//!    into a one-shot continuation handed to the host scheduler

pub mod context;
pub mod delay;
pub mod function;
pub mod intent;
pub mod item;
pub mod jumps;
pub mod section;
pub mod trigger;
mod walk;

#[cfg(test)]
mod tests;

pub use context::{Context, Frame};
pub use delay::{Await, Delay, DelayedEvents, Resume};
pub use function::{Function, Parameter, Signature};
pub use intent::ExecutionIntent;
pub use item::{EffectItem, ItemGraph, ItemId, ItemKind, TriggerItem};
pub use jumps::{Continue, Exit, Return};
pub use section::{Branch, Conditional, LoopSection, Section, SectionExitHandler, SectionKind, WhileSection};
pub use trigger::{Script, Trigger};
