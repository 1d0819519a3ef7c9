//! Declared shapes of published capabilities.
//!
//! A signature travels with a capability's descriptor so the consumer can
//! verify the contract once, at acquire time, instead of discovering a
//! mismatch mid-call.

use serde::{Deserialize, Serialize};

use crate::error::{ExchangeError, ExchangeResult};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Any,
    Nil,
    Boolean,
    Integer,
    Float,
    String,
    Vector,
    Map,
}

impl ValueKind {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::Any => true,
            ValueKind::Nil => matches!(value, Value::Nil),
            ValueKind::Boolean => matches!(value, Value::Boolean(_)),
            ValueKind::Integer => matches!(value, Value::Integer(_)),
            ValueKind::Float => matches!(value, Value::Float(_)),
            ValueKind::String => matches!(value, Value::String(_)),
            ValueKind::Vector => matches!(value, Value::Vector(_)),
            ValueKind::Map => matches!(value, Value::Map(_)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Any => "any",
            ValueKind::Nil => "nil",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Vector => "vector",
            ValueKind::Map => "map",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySignature {
    pub params: Vec<ValueKind>,
    /// Kind accepted for arguments beyond `params`, if the capability is
    /// variadic.
    pub variadic: Option<ValueKind>,
    pub returns: ValueKind,
}

impl CapabilitySignature {
    pub fn new(params: Vec<ValueKind>, returns: ValueKind) -> Self {
        Self {
            params,
            variadic: None,
            returns,
        }
    }

    pub fn variadic(params: Vec<ValueKind>, rest: ValueKind, returns: ValueKind) -> Self {
        Self {
            params,
            variadic: Some(rest),
            returns,
        }
    }

    pub fn validate_inputs(&self, function: &str, inputs: &[Value]) -> ExchangeResult<()> {
        if self.variadic.is_none() && inputs.len() != self.params.len() {
            return Err(ExchangeError::ArityMismatch {
                function: function.to_string(),
                expected: self.params.len().to_string(),
                actual: inputs.len(),
            });
        }
        if inputs.len() < self.params.len() {
            return Err(ExchangeError::ArityMismatch {
                function: function.to_string(),
                expected: format!(">={}", self.params.len()),
                actual: inputs.len(),
            });
        }
        for (i, (input, kind)) in inputs.iter().zip(self.params.iter()).enumerate() {
            if !kind.matches(input) {
                return Err(ExchangeError::TypeError {
                    expected: kind.name().to_string(),
                    actual: input.type_name().to_string(),
                    operation: format!("{} parameter {}", function, i),
                });
            }
        }
        if let Some(rest) = &self.variadic {
            for (i, input) in inputs.iter().enumerate().skip(self.params.len()) {
                if !rest.matches(input) {
                    return Err(ExchangeError::TypeError {
                        expected: rest.name().to_string(),
                        actual: input.type_name().to_string(),
                        operation: format!("{} parameter {}", function, i),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn validate_output(&self, function: &str, output: &Value) -> ExchangeResult<()> {
        if !self.returns.matches(output) {
            return Err(ExchangeError::TypeError {
                expected: self.returns.name().to_string(),
                actual: output.type_name().to_string(),
                operation: format!("{} return value", function),
            });
        }
        Ok(())
    }

    /// Compares a consumer-side expectation (`self`) against the signature a
    /// producer actually published. `Any` on the expectation side is a
    /// wildcard; everything else must match exactly.
    pub fn compatible_with(&self, published: &CapabilitySignature) -> Result<(), String> {
        if self.params.len() != published.params.len() {
            return Err(format!(
                "takes {} parameters, expected {}",
                published.params.len(),
                self.params.len()
            ));
        }
        for (i, (expected, actual)) in self.params.iter().zip(published.params.iter()).enumerate()
        {
            if *expected != ValueKind::Any && expected != actual {
                return Err(format!(
                    "parameter {} is {}, expected {}",
                    i,
                    actual.name(),
                    expected.name()
                ));
            }
        }
        match (&self.variadic, &published.variadic) {
            (None, None) => {}
            (Some(expected), Some(actual)) => {
                if *expected != ValueKind::Any && expected != actual {
                    return Err(format!(
                        "variadic arguments are {}, expected {}",
                        actual.name(),
                        expected.name()
                    ));
                }
            }
            (None, Some(_)) => return Err("is variadic, expected fixed arguments".to_string()),
            (Some(_), None) => return Err("has fixed arguments, expected variadic".to_string()),
        }
        if self.returns != ValueKind::Any && self.returns != published.returns {
            return Err(format!(
                "returns {}, expected {}",
                published.returns.name(),
                self.returns.name()
            ));
        }
        Ok(())
    }
}
