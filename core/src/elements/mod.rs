//! Leaf syntax elements
//!
//! Effects, conditions and expressions are the pieces a parser hands to the
//! engine. Each one does a single thing against the current [`Context`]; the
//! engine decides what runs next.

pub mod conditions;
pub mod effects;
pub mod expressions;

use crate::engine::{Context, ExecutionIntent, Resume};
use crate::syntax::LoadContext;
use crate::value::{Value, ValueType};
use std::fmt;
use std::ops::ControlFlow;

pub use conditions::{FnCondition, IsSet};
pub use effects::{CancelEvent, FnEffect, Log, SetLocal};
pub use expressions::{EventValue, FunctionCall, Literal, LocalVariable, LoopIteration, LoopValue};

/// A statement with a side effect
pub trait Effect: Send + Sync + fmt::Debug {
    /// Perform the effect. `Break` abandons the rest of the invocation without
    /// raising an error.
    fn execute(&self, cx: &mut Context<'_>) -> ControlFlow<()>;

    /// Static jump behaviour of this effect
    fn execution_intent(&self) -> ExecutionIntent {
        ExecutionIntent::None
    }

    /// Load-time validation. An `Err` is reported against the statement's line and
    /// keeps the trigger from loading.
    fn on_load(&mut self, _cx: &mut LoadContext<'_>) -> Result<(), String> {
        Ok(())
    }
}

/// A boolean test
pub trait Condition: Send + Sync + fmt::Debug {
    fn check(&self, cx: &mut Context<'_>) -> bool;
}

/// Produces zero or more values for the current event
pub trait Expression: Send + Sync + fmt::Debug {
    fn values(&self, cx: &mut Context<'_>) -> Vec<Value>;

    /// The first value, if any
    fn single(&self, cx: &mut Context<'_>) -> Option<Value> {
        self.values(cx).into_iter().next()
    }

    /// Whether this expression yields at most one value
    fn is_single(&self) -> bool {
        true
    }

    fn return_type(&self) -> ValueType {
        ValueType::Any
    }

    /// The constant values, if this expression is a literal
    fn literal(&self) -> Option<&[Value]> {
        None
    }
}

/// Work handed back to the host once locals are detached. It must eventually
/// call one of the [`Resume`] methods, or drop it to abandon the invocation.
pub type Pending = Box<dyn FnOnce(Resume) + Send>;

/// A host operation whose completion time is unknown up front
pub trait AsyncOperation: Send + Sync + fmt::Debug {
    /// Evaluate inputs while the event's locals are still live. `None` truncates
    /// the invocation.
    fn begin(&self, cx: &mut Context<'_>) -> Option<Pending>;
}
