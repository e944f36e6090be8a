use super::Expression;
use crate::engine::{Context, Function};
use crate::value::{Value, ValueType};
use std::sync::Arc;

/// Constant values
#[derive(Debug, Clone)]
pub struct Literal {
    values: Vec<Value>,
}

impl Literal {
    pub fn new(value: impl Into<Value>) -> Self {
        Literal { values: vec![value.into()] }
    }

    pub fn list(values: Vec<Value>) -> Self {
        Literal { values }
    }
}

impl Expression for Literal {
    fn values(&self, _cx: &mut Context<'_>) -> Vec<Value> {
        self.values.clone()
    }

    fn is_single(&self) -> bool {
        self.values.len() <= 1
    }

    fn return_type(&self) -> ValueType {
        let mut types = self.values.iter().map(Value::value_type);
        match types.next() {
            Some(first) if types.all(|t| t == first) => first,
            _ => ValueType::Any,
        }
    }

    fn literal(&self) -> Option<&[Value]> {
        Some(&self.values)
    }
}

/// `{_name}`: a variable local to the current event
#[derive(Debug, Clone)]
pub struct LocalVariable {
    name: String,
}

impl LocalVariable {
    pub fn new(name: impl Into<String>) -> Self {
        LocalVariable { name: name.into() }
    }
}

impl Expression for LocalVariable {
    fn values(&self, cx: &mut Context<'_>) -> Vec<Value> {
        cx.local(&self.name).into_iter().collect()
    }
}

/// A named value carried by the event itself
#[derive(Debug, Clone)]
pub struct EventValue {
    key: String,
}

impl EventValue {
    pub fn new(key: impl Into<String>) -> Self {
        EventValue { key: key.into() }
    }
}

impl Expression for EventValue {
    fn values(&self, cx: &mut Context<'_>) -> Vec<Value> {
        cx.event().value(&self.key).cloned().into_iter().collect()
    }
}

/// The value of an enclosing `loop`; level 1 is the innermost
#[derive(Debug, Clone)]
pub struct LoopValue {
    level: usize,
}

impl LoopValue {
    pub fn innermost() -> Self {
        LoopValue { level: 1 }
    }

    pub fn level(level: usize) -> Self {
        LoopValue { level }
    }
}

impl Expression for LoopValue {
    fn values(&self, cx: &mut Context<'_>) -> Vec<Value> {
        cx.loop_value(self.level).into_iter().collect()
    }
}

/// How many times an enclosing loop has started its body
#[derive(Debug, Clone)]
pub struct LoopIteration {
    level: usize,
}

impl LoopIteration {
    pub fn innermost() -> Self {
        LoopIteration { level: 1 }
    }
}

impl Expression for LoopIteration {
    fn values(&self, cx: &mut Context<'_>) -> Vec<Value> {
        cx.loop_iteration(self.level)
            .map(|n| Value::Num(n as f64))
            .into_iter()
            .collect()
    }

    fn return_type(&self) -> ValueType {
        ValueType::Num
    }
}

/// Calls a script function with evaluated arguments
#[derive(Debug)]
pub struct FunctionCall {
    function: Arc<Function>,
    arguments: Vec<Box<dyn Expression>>,
}

impl FunctionCall {
    pub fn new(function: Arc<Function>, arguments: Vec<Box<dyn Expression>>) -> Self {
        FunctionCall { function, arguments }
    }
}

impl Expression for FunctionCall {
    fn values(&self, cx: &mut Context<'_>) -> Vec<Value> {
        let arguments = self.arguments.iter().map(|arg| arg.values(cx)).collect();
        self.function
            .call(cx.runtime(), arguments)
            .unwrap_or_default()
    }

    fn is_single(&self) -> bool {
        self.function.signature().single_return
    }

    fn return_type(&self) -> ValueType {
        self.function.signature().returns.unwrap_or(ValueType::Any)
    }
}
