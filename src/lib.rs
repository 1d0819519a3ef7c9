//! Runtime capability-table exchange between producer and consumer modules.
//!
//! A producer registers a module in a process-wide [`ModuleRegistry`] and
//! publishes an ordered [`CapabilityTable`] under a well-known attribute
//! name. A consumer acquires the table by module name, checking attribute
//! presence, attribute kind, table shape, and per-entry contracts once at
//! the boundary, then invokes entries by name or by fixed index through a
//! caller-owned [`AcquiredTable`] handle.
//!
//! Every mismatch between the two sides of the contract — missing module,
//! missing attribute, wrong attribute kind, wrong entry count, wrong
//! position, wrong shape — surfaces as an explicit [`ExchangeError`] at
//! acquire or invoke time. None of these conditions is retriable; they are
//! build or deployment mismatches the caller should report and abort on.

pub mod consumer;
pub mod error;
pub mod producer;
pub mod registry;
pub mod signature;
pub mod table;
pub mod value;

pub use consumer::{
    acquire, acquire_from, AcquiredTable, CachedTable, ExpectedCapability, TableExpectation,
};
pub use error::{ExchangeError, ExchangeResult};
pub use producer::{publish, publish_as, CAPABILITY_TABLE_ATTR};
pub use registry::{Module, ModuleAttribute, ModuleMetadata, ModuleRegistry};
pub use signature::{CapabilitySignature, ValueKind};
pub use table::{
    CapabilityDescriptor, CapabilityEntry, CapabilityFn, CapabilityTable, TableManifest,
};
pub use value::{Arity, Value};
