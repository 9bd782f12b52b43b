use crate::id::ItemTypeId;
use std::collections::HashMap;

/// Errors raised while building an [`ItemRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("item name already registered: {0}")]
    DuplicateName(String),
    #[error("item not found: {0}")]
    NotFound(String),
}

/// Builder for constructing an immutable [`ItemRegistry`].
#[derive(Debug, Default)]
pub struct ItemRegistryBuilder {
    names: Vec<String>,
    name_to_id: HashMap<String, ItemTypeId>,
}

impl ItemRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item type under a stable name. Returns its ID.
    pub fn register(&mut self, name: &str) -> Result<ItemTypeId, RegistryError> {
        if self.name_to_id.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        let id = ItemTypeId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// Lookup an item type ID by name.
    pub fn id(&self, name: &str) -> Option<ItemTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Freeze the registry.
    pub fn build(self) -> ItemRegistry {
        ItemRegistry {
            names: self.names,
            name_to_id: self.name_to_id,
        }
    }
}

/// Immutable mapping between stable item names and [`ItemTypeId`]s.
///
/// Persisted documents store item names, so IDs may be renumbered between
/// builds without invalidating saves.
#[derive(Debug, Clone)]
pub struct ItemRegistry {
    names: Vec<String>,
    name_to_id: HashMap<String, ItemTypeId>,
}

impl ItemRegistry {
    pub fn id(&self, name: &str) -> Option<ItemTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Like [`id`](Self::id), but an unknown name is an error.
    pub fn require(&self, name: &str) -> Result<ItemTypeId, RegistryError> {
        self.id(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn name(&self, id: ItemTypeId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
