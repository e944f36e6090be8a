//! Script functions
//!
//! A function body is a trigger built with a return contract. Calling it runs
//! the body for a fresh function event with the arguments bound as locals.

use super::context::Frame;
use super::trigger::{Script, Trigger};
use crate::errors::LoadError;
use crate::event::Event;
use crate::host::Runtime;
use crate::syntax::{Loaded, ReturnContract, Statement, TriggerBuilder};
use crate::value::{Value, ValueType};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value_type: ValueType,
    /// A list parameter binds `name::1`, `name::2`, ...
    pub single: bool,
}

impl Parameter {
    pub fn single(name: impl Into<String>, value_type: ValueType) -> Self {
        Parameter { name: name.into(), value_type, single: true }
    }

    pub fn list(name: impl Into<String>, value_type: ValueType) -> Self {
        Parameter { name: name.into(), value_type, single: false }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// `None` for functions that return nothing
    pub returns: Option<ValueType>,
    pub single_return: bool,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Signature {
            name: name.into(),
            parameters: Vec::new(),
            returns: None,
            single_return: true,
        }
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returns(mut self, value_type: ValueType, single: bool) -> Self {
        self.returns = Some(value_type);
        self.single_return = single;
        self
    }
}

#[derive(Debug)]
pub struct Function {
    signature: Signature,
    trigger: Trigger,
}

impl Function {
    /// Build the body. `tick` is the host's tick length, used to check literal delays.
    pub fn load(
        script: &Arc<Script>,
        signature: Signature,
        body: Vec<Statement>,
        tick: Duration,
    ) -> Result<Loaded<Function>, LoadError> {
        let contract = ReturnContract {
            function: signature.name.clone(),
            returns: signature.returns,
            single: signature.single_return,
        };
        let loaded = TriggerBuilder::new(script, format!("function {}", signature.name), "function")
            .tick_length(tick)
            .returning(contract)
            .build(body)?;
        Ok(loaded.map(|trigger| Function { signature, trigger }))
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Call with one value list per parameter. `None` when the arity is wrong or
    /// the body ended without returning.
    pub fn call(&self, runtime: &Runtime, arguments: Vec<Vec<Value>>) -> Option<Vec<Value>> {
        if arguments.len() != self.signature.parameters.len() {
            debug!(
                target: "tripwire::walk",
                function = %self.signature.name,
                expected = self.signature.parameters.len(),
                got = arguments.len(),
                "wrong number of arguments"
            );
            return None;
        }

        let event = Event::new(format!("function {}", self.signature.name));
        let variables = runtime.variables();
        for (parameter, values) in self.signature.parameters.iter().zip(arguments) {
            let mut values = values.into_iter().filter(|value| parameter.value_type.matches(value));
            if parameter.single {
                variables.set_local(&event, &parameter.name, values.next());
            } else {
                for (index, value) in values.enumerate() {
                    variables.set_local(&event, &format!("{}::{}", parameter.name, index + 1), Some(value));
                }
            }
        }

        let mut frame = Frame::new();
        if let Err(err) = self.trigger.run(runtime, &event, &mut frame) {
            error!(target: "tripwire::walk", function = %self.signature.name, "{err}");
            return None;
        }

        let returns = self.signature.returns?;
        let values: Vec<Value> = frame
            .take_returned()?
            .into_iter()
            .filter(|value| returns.matches(value))
            .collect();
        (!values.is_empty()).then_some(values)
    }
}
