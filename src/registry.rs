//! Process-wide module registry.
//!
//! Modules are the exchange's unit of publication: a producer registers a
//! module by name and hangs attributes off it. An attribute is a tagged
//! variant, so a consumer decoding one finds out exactly what kind of value
//! it got instead of reinterpreting an opaque pointer.

use log::warn;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use crate::error::{ExchangeError, ExchangeResult};
use crate::table::CapabilityTable;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct ModuleMetadata {
    pub name: String,
    pub version: Option<String>,
    pub docstring: Option<String>,
    pub registered_at: SystemTime,
}

impl ModuleMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            docstring: None,
            registered_at: SystemTime::now(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }
}

/// A value published under an attribute name on a module.
#[derive(Debug, Clone)]
pub enum ModuleAttribute {
    Table(Arc<CapabilityTable>),
    Value(Value),
}

impl ModuleAttribute {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ModuleAttribute::Table(_) => "capability-table",
            ModuleAttribute::Value(_) => "value",
        }
    }

    pub fn as_table(&self) -> Option<&Arc<CapabilityTable>> {
        match self {
            ModuleAttribute::Table(table) => Some(table),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Module {
    pub metadata: ModuleMetadata,
    attributes: RwLock<HashMap<String, ModuleAttribute>>,
}

impl Module {
    pub fn new(metadata: ModuleMetadata) -> Self {
        Self {
            metadata,
            attributes: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_attribute(
        &self,
        name: impl Into<String>,
        attribute: ModuleAttribute,
    ) -> ExchangeResult<()> {
        let name = name.into();
        let mut attributes = self
            .attributes
            .write()
            .map_err(|e| ExchangeError::InternalError(format!("RwLock poisoned: {}", e)))?;
        if attributes.insert(name.clone(), attribute).is_some() {
            warn!(
                "module {}: attribute {} replaced",
                self.metadata.name, name
            );
        }
        Ok(())
    }

    pub fn get_attribute(&self, name: &str) -> ExchangeResult<Option<ModuleAttribute>> {
        Ok(self
            .attributes
            .read()
            .map_err(|e| ExchangeError::InternalError(format!("RwLock poisoned: {}", e)))?
            .get(name)
            .cloned())
    }

    pub fn attribute_names(&self) -> ExchangeResult<Vec<String>> {
        Ok(self
            .attributes
            .read()
            .map_err(|e| ExchangeError::InternalError(format!("RwLock poisoned: {}", e)))?
            .keys()
            .cloned()
            .collect())
    }
}

/// Registry of all modules loaded in this process.
#[derive(Debug)]
pub struct ModuleRegistry {
    modules: RwLock<HashMap<String, Arc<Module>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(HashMap::new()),
        }
    }

    /// The default process-wide registry. Producers that publish during
    /// program init and consumers that acquire later share this instance.
    pub fn global() -> &'static ModuleRegistry {
        static GLOBAL: Lazy<ModuleRegistry> = Lazy::new(ModuleRegistry::new);
        &GLOBAL
    }

    pub fn register_module(&self, module: Module) -> ExchangeResult<Arc<Module>> {
        let name = module.metadata.name.clone();
        let module = Arc::new(module);
        let mut modules = self
            .modules
            .write()
            .map_err(|e| ExchangeError::InternalError(format!("RwLock poisoned: {}", e)))?;
        if modules.insert(name.clone(), module.clone()).is_some() {
            warn!("module {} re-registered", name);
        }
        Ok(module)
    }

    pub fn get_module(&self, name: &str) -> ExchangeResult<Option<Arc<Module>>> {
        Ok(self
            .modules
            .read()
            .map_err(|e| ExchangeError::InternalError(format!("RwLock poisoned: {}", e)))?
            .get(name)
            .cloned())
    }

    pub fn loaded_modules(&self) -> ExchangeResult<Vec<String>> {
        Ok(self
            .modules
            .read()
            .map_err(|e| ExchangeError::InternalError(format!("RwLock poisoned: {}", e)))?
            .keys()
            .cloned()
            .collect())
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
