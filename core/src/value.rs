//! Runtime values produced by expressions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A value flowing through script expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    Bool(bool),
    Num(f64),
    Str(String),
    Span(Timespan),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Num(_) => ValueType::Num,
            Value::Str(_) => ValueType::Str,
            Value::Span(_) => ValueType::Span,
        }
    }

    pub fn as_timespan(&self) -> Option<Timespan> {
        match self {
            Value::Span(span) => Some(*span),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Truthiness used by conditions that test a plain value
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Num(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Span(_) => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Num(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Span(span) => write!(f, "{span}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Timespan> for Value {
    fn from(span: Timespan) -> Self {
        Value::Span(span)
    }
}

/// Static type of an expression, as far as it is known at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Unknown until evaluated
    Any,
    Bool,
    Num,
    Str,
    Span,
}

impl ValueType {
    /// Whether an expression of type `other` may be used where `self` is declared.
    /// `Any` on either side defers the check to runtime.
    pub fn accepts(self, other: ValueType) -> bool {
        self == ValueType::Any || other == ValueType::Any || self == other
    }

    pub fn matches(self, value: &Value) -> bool {
        self == ValueType::Any || value.value_type() == self
    }

    /// Name with an indefinite article, for diagnostics
    pub fn describe(self) -> &'static str {
        match self {
            ValueType::Any => "an object",
            ValueType::Bool => "a boolean",
            ValueType::Num => "a number",
            ValueType::Str => "a text",
            ValueType::Span => "a timespan",
        }
    }
}

/// A span of real time; `Infinite` is the "forever" literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timespan {
    Finite(Duration),
    Infinite,
}

impl Timespan {
    pub fn from_millis(millis: u64) -> Self {
        Timespan::Finite(Duration::from_millis(millis))
    }

    pub fn from_secs(secs: u64) -> Self {
        Timespan::Finite(Duration::from_secs(secs))
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Timespan::Infinite)
    }

    /// Whole ticks in this span, rounded down. `None` for an infinite span.
    pub fn as_ticks(&self, tick: Duration) -> Option<u64> {
        match self {
            Timespan::Infinite => None,
            Timespan::Finite(_) if tick.is_zero() => Some(0),
            Timespan::Finite(d) => Some(u64::try_from(d.as_nanos() / tick.as_nanos()).unwrap_or(u64::MAX)),
        }
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timespan::Infinite => f.write_str("forever"),
            Timespan::Finite(d) => write!(f, "{}ms", d.as_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_round_down() {
        let tick = Duration::from_millis(50);
        assert_eq!(Timespan::from_millis(0).as_ticks(tick), Some(0));
        assert_eq!(Timespan::from_millis(49).as_ticks(tick), Some(0));
        assert_eq!(Timespan::from_millis(120).as_ticks(tick), Some(2));
        assert_eq!(Timespan::from_secs(1).as_ticks(tick), Some(20));
        assert_eq!(Timespan::Infinite.as_ticks(tick), None);
    }

    #[test]
    fn test_type_acceptance() {
        assert!(ValueType::Num.accepts(ValueType::Num));
        assert!(ValueType::Num.accepts(ValueType::Any));
        assert!(!ValueType::Num.accepts(ValueType::Str));
        assert!(ValueType::Str.matches(&Value::from("x")));
        assert!(!ValueType::Str.matches(&Value::from(1.0)));
    }

    #[test]
    fn test_value_wire_format() {
        let value = serde_json::to_value(Value::from("alex")).unwrap();
        assert_eq!(value, serde_json::json!({ "t": "Str", "v": "alex" }));

        let back: Value = serde_json::from_value(serde_json::json!({ "t": "Num", "v": 2.0 })).unwrap();
        assert_eq!(back, Value::from(2.0));
    }

    #[test]
    fn test_display_whole_numbers() {
        assert_eq!(Value::from(3.0).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
    }
}
