//! Consumer side of the exchange: acquiring a published table and invoking
//! through it.
//!
//! Acquire resolves module, attribute, and table shape in one pass and
//! reports the first mismatch as an explicit error. A consumer never reaches
//! an entry point whose name, position, arity, or signature it has not
//! checked against its own expectation.

use log::debug;
use std::sync::{Arc, RwLock};

use crate::error::{ExchangeError, ExchangeResult};
use crate::producer::CAPABILITY_TABLE_ATTR;
use crate::registry::{ModuleAttribute, ModuleRegistry};
use crate::signature::CapabilitySignature;
use crate::table::{CapabilityDescriptor, CapabilityTable, TableManifest};
use crate::value::{Arity, Value};

/// One capability the consumer requires, in contract order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedCapability {
    pub name: String,
    pub arity: Option<Arity>,
    pub signature: Option<CapabilitySignature>,
}

/// The consumer's side of the table contract: which capabilities must be
/// published, at which positions, with which shapes. The expectation's entry
/// count doubles as the expected table length.
#[derive(Debug, Clone, Default)]
pub struct TableExpectation {
    entries: Vec<ExpectedCapability>,
}

impl TableExpectation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a capability by name only; position is the call order of the
    /// `expect*` builders.
    pub fn expect(mut self, name: impl Into<String>) -> Self {
        self.entries.push(ExpectedCapability {
            name: name.into(),
            arity: None,
            signature: None,
        });
        self
    }

    /// Requires a capability with a full declared shape.
    pub fn expect_with(
        mut self,
        name: impl Into<String>,
        arity: Arity,
        signature: CapabilitySignature,
    ) -> Self {
        self.entries.push(ExpectedCapability {
            name: name.into(),
            arity: Some(arity),
            signature: Some(signature),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self, module: &str, table: &CapabilityTable) -> ExchangeResult<()> {
        if table.len() != self.entries.len() {
            return Err(ExchangeError::TableShapeMismatch {
                module: module.to_string(),
                expected: self.entries.len(),
                actual: table.len(),
            });
        }
        for (index, expected) in self.entries.iter().enumerate() {
            let entry = table
                .get(&expected.name)
                .ok_or_else(|| ExchangeError::CapabilityMissing {
                    module: module.to_string(),
                    capability: expected.name.clone(),
                })?;
            let published_index = table.index_of(&expected.name).unwrap_or(usize::MAX);
            if published_index != index {
                return Err(ExchangeError::SignatureMismatch {
                    capability: expected.name.clone(),
                    detail: format!(
                        "published at index {}, expected index {}",
                        published_index, index
                    ),
                });
            }
            if let Some(arity) = expected.arity {
                if arity != entry.descriptor.arity {
                    return Err(ExchangeError::SignatureMismatch {
                        capability: expected.name.clone(),
                        detail: format!(
                            "arity is {}, expected {}",
                            entry.descriptor.arity, arity
                        ),
                    });
                }
            }
            if let Some(signature) = &expected.signature {
                signature
                    .compatible_with(&entry.descriptor.signature)
                    .map_err(|detail| ExchangeError::SignatureMismatch {
                        capability: expected.name.clone(),
                        detail,
                    })?;
            }
        }
        Ok(())
    }
}

/// Caller-owned handle to a successfully acquired table. Immutable after
/// acquire; re-resolving means acquiring again.
#[derive(Debug, Clone)]
pub struct AcquiredTable {
    module: String,
    attribute: String,
    table: Arc<CapabilityTable>,
}

impl AcquiredTable {
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn descriptor(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.table.get(name).map(|entry| &entry.descriptor)
    }

    pub fn manifest(&self) -> TableManifest {
        self.table.manifest()
    }

    pub fn invoke(&self, name: &str, args: Vec<Value>) -> ExchangeResult<Value> {
        self.table.invoke(name, args)
    }

    pub fn invoke_index(&self, index: usize, args: Vec<Value>) -> ExchangeResult<Value> {
        self.table.invoke_index(index, args)
    }
}

/// Acquires the table published under the well-known attribute name.
pub fn acquire(
    registry: &ModuleRegistry,
    module: &str,
    expectation: &TableExpectation,
) -> ExchangeResult<AcquiredTable> {
    acquire_from(registry, module, CAPABILITY_TABLE_ATTR, expectation)
}

/// Acquires a table published under an explicit attribute name.
///
/// Resolution order: module lookup, then attribute lookup, then tagged
/// decode, then the expectation's shape and per-entry checks. The first
/// failure aborts the acquire; a wrong attribute kind is a hard
/// [`ExchangeError::TypeMismatch`], never a silent no-op.
pub fn acquire_from(
    registry: &ModuleRegistry,
    module_name: &str,
    attribute: &str,
    expectation: &TableExpectation,
) -> ExchangeResult<AcquiredTable> {
    let module = registry
        .get_module(module_name)?
        .ok_or_else(|| ExchangeError::ModuleNotFound {
            module: module_name.to_string(),
        })?;
    let published =
        module
            .get_attribute(attribute)?
            .ok_or_else(|| ExchangeError::AttributeMissing {
                module: module_name.to_string(),
                attribute: attribute.to_string(),
            })?;
    let table = match published {
        ModuleAttribute::Table(table) => table,
        other => {
            return Err(ExchangeError::TypeMismatch {
                module: module_name.to_string(),
                attribute: attribute.to_string(),
                expected: "capability-table",
                actual: other.kind_name(),
            })
        }
    };
    expectation.check(module_name, &table)?;
    debug!(
        "acquired capability table {}.{} with {} entries",
        module_name,
        attribute,
        table.len()
    );
    Ok(AcquiredTable {
        module: module_name.to_string(),
        attribute: attribute.to_string(),
        table,
    })
}

/// Re-acquirable process-wide slot for consumers that want one shared table
/// instead of threading an [`AcquiredTable`] through call sites. The
/// lifecycle is explicit: invoking before a successful acquire is an error,
/// a failed re-acquire leaves the previous table in place, and a successful
/// one replaces it.
#[derive(Debug, Default)]
pub struct CachedTable {
    slot: RwLock<Option<Arc<AcquiredTable>>>,
}

impl CachedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(
        &self,
        registry: &ModuleRegistry,
        module: &str,
        expectation: &TableExpectation,
    ) -> ExchangeResult<()> {
        self.acquire_from(registry, module, CAPABILITY_TABLE_ATTR, expectation)
    }

    pub fn acquire_from(
        &self,
        registry: &ModuleRegistry,
        module: &str,
        attribute: &str,
        expectation: &TableExpectation,
    ) -> ExchangeResult<()> {
        let acquired = acquire_from(registry, module, attribute, expectation)?;
        let mut slot = self
            .slot
            .write()
            .map_err(|e| ExchangeError::InternalError(format!("RwLock poisoned: {}", e)))?;
        *slot = Some(Arc::new(acquired));
        Ok(())
    }

    pub fn is_acquired(&self) -> bool {
        self.slot.read().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Snapshot of the current table; the handle stays valid even if the
    /// slot is re-acquired concurrently.
    pub fn get(&self) -> ExchangeResult<Arc<AcquiredTable>> {
        self.slot
            .read()
            .map_err(|e| ExchangeError::InternalError(format!("RwLock poisoned: {}", e)))?
            .clone()
            .ok_or(ExchangeError::NotAcquired)
    }

    pub fn invoke(&self, name: &str, args: Vec<Value>) -> ExchangeResult<Value> {
        self.get()?.invoke(name, args)
    }

    pub fn invoke_index(&self, index: usize, args: Vec<Value>) -> ExchangeResult<Value> {
        self.get()?.invoke_index(index, args)
    }
}
