use super::{Condition, Expression};
use crate::engine::Context;
use std::fmt;

/// `<expression> is set`
#[derive(Debug)]
pub struct IsSet {
    expression: Box<dyn Expression>,
    negated: bool,
}

impl IsSet {
    pub fn new(expression: Box<dyn Expression>) -> Self {
        IsSet { expression, negated: false }
    }

    pub fn not(expression: Box<dyn Expression>) -> Self {
        IsSet { expression, negated: true }
    }
}

impl Condition for IsSet {
    fn check(&self, cx: &mut Context<'_>) -> bool {
        self.expression.values(cx).is_empty() == self.negated
    }
}

type ConditionFn = dyn Fn(&mut Context<'_>) -> bool + Send + Sync;

/// A condition backed by a closure
pub struct FnCondition {
    label: String,
    test: Box<ConditionFn>,
}

impl FnCondition {
    pub fn new<F>(label: impl Into<String>, test: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> bool + Send + Sync + 'static,
    {
        FnCondition { label: label.into(), test: Box::new(test) }
    }
}

impl fmt::Debug for FnCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

impl Condition for FnCondition {
    fn check(&self, cx: &mut Context<'_>) -> bool {
        (self.test)(cx)
    }
}
