//! The statement tree a parser hands to the [`TriggerBuilder`](super::TriggerBuilder)

use super::sections::SectionFilter;
use crate::elements::{AsyncOperation, Condition, Effect, Expression};

/// One script line, with its nested body for sections
#[derive(Debug)]
pub enum Statement {
    Effect(Box<dyn Effect>),
    /// A standalone condition: falling through requires it to hold
    Condition(Box<dyn Condition>),
    /// `<effect> if <guard>`
    Guarded {
        guard: Box<dyn Condition>,
        effect: Box<dyn Effect>,
    },
    /// `wait <duration>`
    Delay(Box<dyn Expression>),
    /// Wait for a host operation to complete
    Await(Box<dyn AsyncOperation>),
    /// `continue` or `continue the <level>th loop`, levels counted from the outermost
    Continue(Option<usize>),
    Exit(ExitTarget),
    Return(Box<dyn Expression>),
    If {
        condition: Box<dyn Condition>,
        body: Vec<Statement>,
    },
    ElseIf {
        condition: Box<dyn Condition>,
        body: Vec<Statement>,
    },
    Else(Vec<Statement>),
    Loop {
        expression: Box<dyn Expression>,
        body: Vec<Statement>,
    },
    While {
        condition: Box<dyn Condition>,
        body: Vec<Statement>,
        do_while: bool,
    },
}

/// What an `exit` statement leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTarget {
    /// `stop`: the whole trigger
    Trigger,
    /// `exit <count> sections|loops|conditionals`
    Sections { count: usize, filter: SectionFilter },
    /// `exit all sections|loops|conditionals`
    All(SectionFilter),
}

impl Statement {
    pub fn effect(effect: impl Effect + 'static) -> Self {
        Statement::Effect(Box::new(effect))
    }

    pub fn condition(condition: impl Condition + 'static) -> Self {
        Statement::Condition(Box::new(condition))
    }

    pub fn delay(duration: impl Expression + 'static) -> Self {
        Statement::Delay(Box::new(duration))
    }

    pub fn if_(condition: impl Condition + 'static, body: Vec<Statement>) -> Self {
        Statement::If { condition: Box::new(condition), body }
    }

    pub fn else_if(condition: impl Condition + 'static, body: Vec<Statement>) -> Self {
        Statement::ElseIf { condition: Box::new(condition), body }
    }

    pub fn loop_(expression: impl Expression + 'static, body: Vec<Statement>) -> Self {
        Statement::Loop { expression: Box::new(expression), body }
    }

    pub fn while_(condition: impl Condition + 'static, body: Vec<Statement>) -> Self {
        Statement::While { condition: Box::new(condition), body, do_while: false }
    }

    pub fn stop() -> Self {
        Statement::Exit(ExitTarget::Trigger)
    }

    pub fn exit(count: usize, filter: SectionFilter) -> Self {
        Statement::Exit(ExitTarget::Sections { count, filter })
    }

    pub fn ret(value: impl Expression + 'static) -> Self {
        Statement::Return(Box::new(value))
    }
}
