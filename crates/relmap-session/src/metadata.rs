//! Entity metadata and its cache.
//!
//! Metadata is built once per entity type, on first use, and shared for the
//! lifetime of the owning [`Database`](crate::Database). Building resolves a
//! converter for every simple property through the dialect chain and builds
//! (or fetches) the row mapper of every nested type.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use relmap_core::{ConfigError, MappingError, NamingConvention, TypeInfo, Value};
use relmap_dialect::{ConverterRef, DialectChain};

use crate::association::Association;
use crate::entity::{DeclKind, Entity, EntityBuilder, JoinDecl, ValueAccess};
use crate::row_mapper::{NestedSlot, RowMapper};

/// A column-backed property with its resolved converter.
pub struct SimpleProperty<E> {
    pub(crate) name: &'static str,
    pub(crate) column: String,
    pub(crate) ty: TypeInfo,
    pub(crate) converter: ConverterRef,
    pub(crate) access: ValueAccess<E>,
}

impl<E> SimpleProperty<E> {
    /// Property name as declared.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Column name after the naming convention.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Declared type of the property.
    pub fn type_info(&self) -> TypeInfo {
        self.ty
    }

    /// Converter resolved for the property type.
    pub fn converter(&self) -> &ConverterRef {
        &self.converter
    }

    /// Canonical value of this property on `entity`.
    pub fn get(&self, entity: &E) -> Result<Value, MappingError> {
        (self.access.get)(entity)
    }
}

/// Everything needed to map and bind one entity type.
pub struct EntityMetadata<E> {
    pub(crate) type_name: &'static str,
    pub(crate) table: &'static str,
    pub(crate) id_property: &'static str,
    pub(crate) simple: Vec<SimpleProperty<E>>,
    pub(crate) nested: Vec<Box<dyn NestedSlot<E>>>,
    pub(crate) associations: Vec<Association<E>>,
}

impl<E> EntityMetadata<E> {
    /// Short type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Table the entity is stored in.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Simple properties in declaration order.
    pub fn simple_properties(&self) -> &[SimpleProperty<E>] {
        &self.simple
    }

    /// A column-backed property by name.
    pub fn simple_property(&self, name: &str) -> Option<&SimpleProperty<E>> {
        self.simple.iter().find(|p| p.name == name)
    }

    /// Names of the nested properties in declaration order.
    pub fn nested_properties(&self) -> Vec<&'static str> {
        self.nested.iter().map(|n| n.property()).collect()
    }

    /// An association by property name.
    pub fn association(&self, name: &str) -> Option<&Association<E>> {
        self.associations.iter().find(|a| a.descriptor.property == name)
    }

    /// The identifier property.
    pub fn id(&self) -> Result<&SimpleProperty<E>, ConfigError> {
        self.simple_property(self.id_property)
            .ok_or_else(|| ConfigError::MissingIdProperty {
                entity: self.type_name.to_string(),
                property: self.id_property.to_string(),
            })
    }
}

/// Declaration of a nested property, resolved against the cache at build time.
pub(crate) trait NestedDecl<E>: Send + Sync {
    fn type_info(&self) -> TypeInfo;

    fn resolve(
        &self,
        name: &'static str,
        join: Option<JoinDecl>,
        cache: &MetadataCache,
    ) -> Result<Box<dyn NestedSlot<E>>, ConfigError>;
}

thread_local! {
    static BUILDING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// Pops the in-progress marker even when a build fails.
struct BuildGuard;

impl BuildGuard {
    fn enter(ty: TypeId, type_name: &str) -> Result<Self, ConfigError> {
        BUILDING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&ty) {
                return Err(ConfigError::RecursiveNesting {
                    type_name: type_name.to_string(),
                });
            }
            stack.push(ty);
            Ok(Self)
        })
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        BUILDING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Per-chain cache of row mappers, keyed by entity type.
///
/// Reads take a shared lock. A miss builds outside any lock, then inserts
/// unless another thread got there first; the first insert wins and every
/// caller sees that entry, never a partial one.
pub struct MetadataCache {
    chain: Arc<DialectChain>,
    naming: NamingConvention,
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl MetadataCache {
    /// An empty cache resolving through `chain`.
    pub fn new(chain: Arc<DialectChain>, naming: NamingConvention) -> Self {
        Self {
            chain,
            naming,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The chain converters are resolved through.
    pub fn chain(&self) -> &DialectChain {
        &self.chain
    }

    /// The naming convention applied to columns.
    pub fn naming(&self) -> NamingConvention {
        self.naming
    }

    /// Number of cached entity types.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no metadata has been built yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether `E` has been built.
    pub fn contains<E: Entity>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<E>())
    }

    /// The row mapper for `E`, building and caching it on first use.
    pub fn mapper<E: Entity>(&self) -> Result<Arc<RowMapper<E>>, ConfigError> {
        let key = TypeId::of::<E>();
        let cached = self.entries.read().get(&key).cloned();
        if let Some(entry) = cached {
            return downcast::<E>(entry);
        }

        let built: Arc<dyn Any + Send + Sync> = Arc::new(self.build::<E>()?);
        let entry = self.entries.write().entry(key).or_insert(built).clone();
        downcast::<E>(entry)
    }

    fn build<E: Entity>(&self) -> Result<RowMapper<E>, ConfigError> {
        let info = TypeInfo::structure::<E>();
        let _guard = BuildGuard::enter(info.id(), info.short_name())?;

        let mut builder = EntityBuilder::<E>::new();
        E::describe(&mut builder);

        let mut simple = Vec::new();
        let mut nested = Vec::new();
        for decl in builder.properties {
            match decl.kind {
                DeclKind::Simple { ty, access } => {
                    let converter = self.chain.converter_for(&ty)?;
                    simple.push(SimpleProperty {
                        name: decl.name,
                        column: decl
                            .column
                            .unwrap_or_else(|| self.naming.column_name(decl.name)),
                        ty,
                        converter,
                        access,
                    });
                }
                DeclKind::Nested(nested_decl) => {
                    let ty = nested_decl.type_info();
                    if self.chain.resolve(&ty)?.is_some() {
                        return Err(ConfigError::AmbiguousMapping {
                            type_name: ty.name().to_string(),
                            property: decl.name.to_string(),
                        });
                    }
                    nested.push(nested_decl.resolve(decl.name, decl.join, self)?);
                }
            }
        }

        let associations: Vec<Association<E>> = builder
            .associations
            .into_iter()
            .map(Association::from)
            .collect();

        tracing::debug!(
            target: "relmap::mapper",
            entity = info.short_name(),
            simple = simple.len(),
            nested = nested.len(),
            associations = associations.len(),
            "Built entity metadata"
        );

        Ok(RowMapper::new(EntityMetadata {
            type_name: info.short_name(),
            table: E::TABLE_NAME,
            id_property: E::ID_PROPERTY,
            simple,
            nested,
            associations,
        }))
    }
}

fn downcast<E: Entity>(entry: Arc<dyn Any + Send + Sync>) -> Result<Arc<RowMapper<E>>, ConfigError> {
    entry
        .downcast::<RowMapper<E>>()
        .map_err(|_| ConfigError::CacheTypeMismatch {
            type_name: std::any::type_name::<E>().to_string(),
        })
}

impl<E> std::fmt::Debug for SimpleProperty<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleProperty")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("chain", &self.chain)
            .field("naming", &self.naming)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmap_dialect::Engine;

    #[derive(Debug, Default)]
    struct Team {
        id: i64,
        name: String,
    }

    impl Entity for Team {
        const TABLE_NAME: &'static str = "teams";

        fn describe(b: &mut EntityBuilder<Self>) {
            b.field("id", |t| &t.id, |t| &mut t.id);
            b.field("name", |t| &t.name, |t| &mut t.name);
        }
    }

    #[derive(Debug, Default)]
    struct Player {
        id: i64,
        team: Option<Team>,
    }

    impl Entity for Player {
        const TABLE_NAME: &'static str = "players";

        fn describe(b: &mut EntityBuilder<Self>) {
            b.field("id", |p| &p.id, |p| &mut p.id);
            b.nested("team", |p| &mut p.team);
        }
    }

    #[derive(Debug, Default)]
    struct Node {
        id: i64,
        parent: Option<Box<Node>>,
    }

    impl Entity for Box<Node> {
        const TABLE_NAME: &'static str = "nodes";

        fn describe(b: &mut EntityBuilder<Self>) {
            b.field("id", |n| &n.id, |n| &mut n.id);
            b.nested("parent", |n| &mut n.parent);
        }
    }

    relmap_core::composite_type! {
        #[derive(Debug, Clone, PartialEq)]
        struct Venue {
            city: Option<String>,
        }
    }

    #[derive(Debug, Default)]
    struct Match {
        id: i64,
        venue: Option<Venue>,
    }

    impl Entity for Match {
        const TABLE_NAME: &'static str = "matches";

        fn describe(b: &mut EntityBuilder<Self>) {
            b.field("id", |m| &m.id, |m| &mut m.id);
            b.optional("venue", |m| &m.venue, |m| &mut m.venue);
        }
    }

    #[derive(Debug, Default)]
    struct Anonymous {
        name: String,
    }

    impl Entity for Anonymous {
        const TABLE_NAME: &'static str = "anonymous";

        fn describe(b: &mut EntityBuilder<Self>) {
            b.field("name", |a| &a.name, |a| &mut a.name);
        }
    }

    #[derive(Debug, Default)]
    struct Stadium {
        id: i64,
        location: relmap_core::Point,
    }

    impl Entity for Stadium {
        const TABLE_NAME: &'static str = "stadiums";

        fn describe(b: &mut EntityBuilder<Self>) {
            b.field("id", |s| &s.id, |s| &mut s.id);
            b.field("location", |s| &s.location, |s| &mut s.location);
        }
    }

    fn cache_for(chain: DialectChain) -> MetadataCache {
        MetadataCache::new(Arc::new(chain), NamingConvention::SnakeCase)
    }

    #[test]
    fn test_nested_types_are_cached_too() {
        let cache = cache_for(DialectChain::default());
        assert!(cache.is_empty());
        cache.mapper::<Player>().unwrap();
        assert!(cache.contains::<Player>());
        assert!(cache.contains::<Team>());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_second_lookup_returns_same_entry() {
        let cache = cache_for(DialectChain::default());
        let first = cache.mapper::<Team>().unwrap();
        let second = cache.mapper::<Team>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_first_use_shares_one_entry() {
        let cache = cache_for(Engine::Postgres.chain(4326));
        let mappers: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.mapper::<Player>().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let stored = cache.mapper::<Player>().unwrap();
        assert!(mappers.iter().all(|m| Arc::ptr_eq(m, &stored)));
    }

    #[test]
    fn test_recursive_nesting_rejected() {
        let cache = cache_for(DialectChain::default());
        let err = cache.mapper::<Box<Node>>().unwrap_err();
        assert!(matches!(err, ConfigError::RecursiveNesting { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_nested_type_registered_as_column_is_ambiguous() {
        let chain = DialectChain::default();
        chain.register_json::<Team>();
        let err = cache_for(chain).mapper::<Player>().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::AmbiguousMapping { ref property, .. } if property == "team"
        ));
    }

    #[test]
    fn test_unregistered_composite_is_not_configured() {
        let err = cache_for(Engine::Postgres.chain(4326))
            .mapper::<Match>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::TypeNotConfigured { .. }));

        let chain = Engine::Postgres.chain(4326);
        chain.register_composite::<Venue>("venue");
        assert!(cache_for(chain).mapper::<Match>().is_ok());
    }

    #[test]
    fn test_missing_id_property() {
        let mapper = cache_for(DialectChain::default())
            .mapper::<Anonymous>()
            .unwrap();
        let err = mapper.metadata().id().unwrap_err();
        assert!(matches!(err, ConfigError::MissingIdProperty { ref property, .. } if property == "id"));
    }

    #[test]
    fn test_unresolved_field_is_not_treated_as_nested() {
        let err = cache_for(DialectChain::default())
            .mapper::<Stadium>()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedType { ref chain, .. } if chain == "generic"
        ));
        assert!(cache_for(Engine::Postgres.chain(4326)).mapper::<Stadium>().is_ok());
    }
}
