//! Producer side of the exchange: publishing a capability table under a
//! well-known attribute name during module init.

use log::debug;
use std::sync::Arc;

use crate::error::ExchangeResult;
use crate::registry::{Module, ModuleAttribute, ModuleMetadata, ModuleRegistry};
use crate::table::CapabilityTable;

/// Well-known attribute name under which producers publish their table.
/// Consumers that do not negotiate a custom attribute look here.
pub const CAPABILITY_TABLE_ATTR: &str = "_capability_table";

/// Publishes `table` under [`CAPABILITY_TABLE_ATTR`] on the module named in
/// `metadata`, registering the module first if it is not already loaded.
pub fn publish(
    registry: &ModuleRegistry,
    metadata: ModuleMetadata,
    table: CapabilityTable,
) -> ExchangeResult<Arc<Module>> {
    publish_as(registry, metadata, CAPABILITY_TABLE_ATTR, table)
}

/// Publishes `table` under an explicit attribute name. Re-publishing replaces
/// the previous table for subsequent acquires; handles already acquired keep
/// the table they resolved.
pub fn publish_as(
    registry: &ModuleRegistry,
    metadata: ModuleMetadata,
    attribute: &str,
    table: CapabilityTable,
) -> ExchangeResult<Arc<Module>> {
    let module_name = metadata.name.clone();
    let module = match registry.get_module(&module_name)? {
        Some(existing) => existing,
        None => registry.register_module(Module::new(metadata))?,
    };
    debug!(
        "publishing capability table with {} entries as {}.{}",
        table.len(),
        module_name,
        attribute
    );
    module.set_attribute(attribute, ModuleAttribute::Table(Arc::new(table)))?;
    Ok(module)
}
