//! A read-only set of definitions keyed by shape name.
//!
//! Relations declared with [`Relation::to_shape`] find their definition
//! here, which is what makes self-referencing shapes possible. A registry
//! can be passed to a [`Serializer`] explicitly or installed once for the
//! whole process with [`install`].
//!
//! [`Relation::to_shape`]: crate::definition::Relation::to_shape
//! [`Serializer`]: crate::ser::Serializer

use crate::context::Context;
use crate::definition::Definition;
use crate::error::{Error, Result};
use crate::object::Target;
use crate::selection::Selection;
use crate::ser::Serializer;
use crate::value::Serialized;

use indexmap::IndexMap;
use log::debug;
use once_cell::sync::OnceCell;
use std::sync::Arc;

static GLOBAL_REGISTRY: OnceCell<Registry> = OnceCell::new();

#[derive(Clone, Debug, Default)]
pub struct Registry {
    definitions: IndexMap<String, Arc<Definition>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, shape: &str) -> Option<&Arc<Definition>> {
        self.definitions.get(shape)
    }

    pub fn definition(&self, shape: &str) -> Result<&Definition> {
        self.get(shape)
            .map(Arc::as_ref)
            .ok_or_else(|| Error::UnknownShape(shape.to_owned()))
    }

    pub fn shapes(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Serializes `target` with the definition registered for `shape`.
    pub fn serialize<'a>(
        &self,
        shape: &str,
        target: impl Into<Target<'a>>,
        context: &Context,
        selection: &Selection,
    ) -> Result<Serialized> {
        Serializer::new()
            .with_registry(self)
            .serialize(self.definition(shape)?, target, context, selection)
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    definitions: IndexMap<String, Arc<Definition>>,
}

impl RegistryBuilder {
    pub fn register(mut self, definition: impl Into<Arc<Definition>>) -> Result<Self> {
        let definition = definition.into();
        let shape = definition.name().to_owned();
        if self.definitions.contains_key(&shape) {
            return Err(Error::DuplicateShape(shape));
        }
        self.definitions.insert(shape, definition);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            definitions: self.definitions,
        }
    }
}

/// Installs the process-wide registry. This can happen only once.
pub fn install(registry: Registry) -> Result<&'static Registry> {
    debug!(
        "installing global registry with shapes {:?}",
        registry.shapes().collect::<Vec<_>>()
    );
    GLOBAL_REGISTRY
        .try_insert(registry)
        .map_err(|_| Error::RegistryInstalled)
}

/// The process-wide registry, if one was installed.
pub fn global() -> Option<&'static Registry> {
    GLOBAL_REGISTRY.get()
}
