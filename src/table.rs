//! The capability table: an insertion-ordered collection of named, typed
//! entry points published by a producer module.
//!
//! Entry order is part of the producer/consumer contract. A capability's
//! index is its insertion position and stays stable for the table's
//! lifetime, so consumers that dispatch by index see the same layout the
//! producer declared.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ExchangeError, ExchangeResult};
use crate::signature::CapabilitySignature;
use crate::value::{Arity, Value};

pub type CapabilityFn = Arc<dyn Fn(Vec<Value>) -> ExchangeResult<Value> + Send + Sync>;

/// Declared contract of a single capability. Descriptors are serializable so
/// a table's layout can be rendered for diagnostics and contract review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    pub arity: Arity,
    pub signature: CapabilitySignature,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CapabilityDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        arity: Arity,
        signature: CapabilitySignature,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arity,
            signature,
            metadata: HashMap::new(),
        }
    }
}

#[derive(Clone)]
pub struct CapabilityEntry {
    pub descriptor: CapabilityDescriptor,
    pub func: CapabilityFn,
}

impl fmt::Debug for CapabilityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityEntry")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

#[derive(Debug)]
pub struct CapabilityTable {
    name: String,
    version: String,
    entries: IndexMap<String, CapabilityEntry>,
}

impl CapabilityTable {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers a capability at the next index. Names must be unique within
    /// a table.
    pub fn register(
        &mut self,
        descriptor: CapabilityDescriptor,
        func: CapabilityFn,
    ) -> ExchangeResult<()> {
        if self.entries.contains_key(&descriptor.name) {
            return Err(ExchangeError::DuplicateCapability {
                capability: descriptor.name.clone(),
            });
        }
        self.entries
            .insert(descriptor.name.clone(), CapabilityEntry { descriptor, func });
        Ok(())
    }

    /// Convenience form of [`register`](Self::register) for plain closures.
    pub fn register_fn<F>(&mut self, descriptor: CapabilityDescriptor, func: F) -> ExchangeResult<()>
    where
        F: Fn(Vec<Value>) -> ExchangeResult<Value> + Send + Sync + 'static,
    {
        self.register(descriptor, Arc::new(func))
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityEntry> {
        self.entries.get(name)
    }

    pub fn get_index(&self, index: usize) -> Option<&CapabilityEntry> {
        self.entries.get_index(index).map(|(_, entry)| entry)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.entries.values().map(|entry| &entry.descriptor)
    }

    /// Invoke by name: arity check, input validation, call, output
    /// validation.
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> ExchangeResult<Value> {
        let entry = self.get(name).ok_or_else(|| ExchangeError::CapabilityMissing {
            module: self.name.clone(),
            capability: name.to_string(),
        })?;
        Self::call(entry, args)
    }

    /// Invoke by fixed index, bounds-checked.
    pub fn invoke_index(&self, index: usize, args: Vec<Value>) -> ExchangeResult<Value> {
        let entry = self
            .get_index(index)
            .ok_or(ExchangeError::IndexOutOfBounds {
                index,
                len: self.entries.len(),
            })?;
        Self::call(entry, args)
    }

    fn call(entry: &CapabilityEntry, args: Vec<Value>) -> ExchangeResult<Value> {
        let descriptor = &entry.descriptor;
        if !descriptor.arity.check(args.len()) {
            return Err(ExchangeError::ArityMismatch {
                function: descriptor.name.clone(),
                expected: descriptor.arity.to_string(),
                actual: args.len(),
            });
        }
        descriptor.signature.validate_inputs(&descriptor.name, &args)?;
        let result = (entry.func)(args)?;
        descriptor.signature.validate_output(&descriptor.name, &result)?;
        Ok(result)
    }

    pub fn manifest(&self) -> TableManifest {
        TableManifest {
            name: self.name.clone(),
            version: self.version.clone(),
            capabilities: self.descriptors().cloned().collect(),
        }
    }
}

/// Serializable summary of a table's layout, in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableManifest {
    pub name: String,
    pub version: String,
    pub capabilities: Vec<CapabilityDescriptor>,
}

impl TableManifest {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
