//! Per-dialect registration of enum, composite and JSON types.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

/// Type registrations owned by one dialect.
///
/// Registration normally happens at startup, but enum database type names
/// discovered while resolving are memoized here too, so every map is guarded
/// for concurrent readers and writers.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    enums: RwLock<HashMap<TypeId, String>>,
    composites: RwLock<HashMap<TypeId, String>>,
    json: RwLock<HashSet<TypeId>>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `ty` in the database enum type `db_type`.
    pub fn register_enum(&self, ty: TypeId, db_type: impl Into<String>) {
        self.enums.write().insert(ty, db_type.into());
    }

    /// Database enum type registered for `ty`.
    pub fn enum_type(&self, ty: TypeId) -> Option<String> {
        self.enums.read().get(&ty).cloned()
    }

    /// Record a discovered enum type name unless one is already present.
    ///
    /// Returns the name that ended up registered; concurrent discoveries
    /// agree on a single winner.
    pub fn memoize_enum(&self, ty: TypeId, db_type: &str) -> String {
        if let Some(existing) = self.enums.read().get(&ty) {
            return existing.clone();
        }
        self.enums
            .write()
            .entry(ty)
            .or_insert_with(|| db_type.to_string())
            .clone()
    }

    /// Store `ty` in the database composite type `db_type`.
    pub fn register_composite(&self, ty: TypeId, db_type: impl Into<String>) {
        self.composites.write().insert(ty, db_type.into());
    }

    /// Database composite type registered for `ty`.
    pub fn composite_type(&self, ty: TypeId) -> Option<String> {
        self.composites.read().get(&ty).cloned()
    }

    /// Store `ty` as a JSON document.
    pub fn register_json(&self, ty: TypeId) {
        self.json.write().insert(ty);
    }

    /// Whether `ty` is stored as a JSON document.
    pub fn is_json(&self, ty: TypeId) -> bool {
        self.json.read().contains(&ty)
    }
}
