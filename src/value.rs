//! Dynamic values that cross the capability table boundary.
//!
//! Capabilities are invoked with runtime-typed arguments; both sides of the
//! exchange agree on shapes through [`crate::signature::CapabilitySignature`]
//! rather than through the values themselves.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Vector(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Vector(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(" "))
            }
            Value::Map(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{} {}", k, v))
                    .collect();
                write!(f, "{{{}}}", parts.join(" "))
            }
        }
    }
}

/// Declared argument count of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arity {
    Fixed(usize),
    /// Minimum number of arguments
    Variadic(usize),
    Range(usize, usize),
}

impl Arity {
    pub fn check(&self, actual: usize) -> bool {
        match self {
            Arity::Fixed(n) => actual == *n,
            Arity::Variadic(min) => actual >= *min,
            Arity::Range(min, max) => actual >= *min && actual <= *max,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Variadic(min) => write!(f, ">={}", min),
            Arity::Range(min, max) => write!(f, "{}..={}", min, max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_check_covers_all_forms() {
        assert!(Arity::Fixed(2).check(2));
        assert!(!Arity::Fixed(2).check(3));
        assert!(Arity::Variadic(1).check(1));
        assert!(Arity::Variadic(1).check(5));
        assert!(!Arity::Variadic(1).check(0));
        assert!(Arity::Range(1, 2).check(2));
        assert!(!Arity::Range(1, 2).check(3));
    }

    #[test]
    fn arity_display_matches_contract_notation() {
        assert_eq!(Arity::Fixed(0).to_string(), "0");
        assert_eq!(Arity::Variadic(1).to_string(), ">=1");
        assert_eq!(Arity::Range(1, 2).to_string(), "1..=2");
    }

    #[test]
    fn value_type_names_are_stable() {
        assert_eq!(Value::Nil.type_name(), "nil");
        assert_eq!(Value::Integer(1).type_name(), "integer");
        assert_eq!(Value::Vector(vec![]).type_name(), "vector");
    }
}
