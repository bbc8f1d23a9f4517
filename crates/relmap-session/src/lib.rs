//! Entity mapping, repositories and batch association loading for relmap.
//!
//! `relmap-session` is the **mapping layer**. It turns rows into entities
//! and entities into bound parameters, and loads one-to-many associations
//! without N+1 queries.
//!
//! # Role In The Architecture
//!
//! - **Declarations**: entities implement [`Entity`] and describe their
//!   properties through an [`EntityBuilder`]; no runtime reflection.
//! - **Metadata cache**: each entity's metadata is built once per
//!   [`Database`], resolving a converter per simple property through the
//!   dialect chain.
//! - **Row mapping**: [`RowMapper`] reads simple columns directly and nested
//!   objects through column-prefixed views (`group.id`, `group.name`).
//! - **Associations**: [`Database::load_association`] fills a collection on
//!   any number of parents with a single query.
//! - **N+1 detection**: repeated single-parent loads are counted and logged.
//!
//! # Example
//!
//! ```ignore
//! let db = Database::new(connection, DatabaseConfig::default());
//! db.register::<User>()?.register::<Post>()?;
//!
//! let mut users = db.repository::<User>()?.find_all()?;
//! db.load_association(&mut users, "posts")?;
//! ```

pub mod association;
pub mod config;
pub mod entity;
pub mod metadata;
pub mod n1_detection;
pub mod repository;
pub mod row_mapper;

pub use association::{Association, ValueKey};
pub use config::DatabaseConfig;
pub use entity::{AssociationDecl, Entity, EntityBuilder, PropertyDecl};
pub use metadata::{EntityMetadata, MetadataCache, SimpleProperty};
pub use n1_detection::{CallSite, N1QueryTracker, N1Stats};
pub use repository::Repository;
pub use row_mapper::{BoundValue, RowMapper};

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use relmap_core::{ConfigError, Connection, Result};
use relmap_dialect::DialectChain;

use crate::association::LoadContext;

/// A connection together with its dialect chain, metadata cache and
/// registered repositories.
///
/// All methods take `&self`; the caches are safe to populate from several
/// threads sharing one `Database`.
pub struct Database<C: Connection> {
    connection: C,
    chain: Arc<DialectChain>,
    cache: MetadataCache,
    registered: RwLock<HashSet<TypeId>>,
    n1: Mutex<N1QueryTracker>,
    config: DatabaseConfig,
}

impl<C: Connection> Database<C> {
    /// A database using the standard chain for `config.engine`.
    pub fn new(connection: C, config: DatabaseConfig) -> Self {
        let chain = config.engine.chain(config.srid);
        Self::with_chain(connection, chain, config)
    }

    /// A database using a custom dialect chain; `config.engine` and
    /// `config.srid` are ignored.
    pub fn with_chain(connection: C, chain: DialectChain, config: DatabaseConfig) -> Self {
        let chain = Arc::new(chain);
        tracing::debug!(
            target: "relmap::repo",
            chain = %chain.describe(),
            naming = ?config.naming,
            "Opening database"
        );
        Self {
            connection,
            cache: MetadataCache::new(Arc::clone(&chain), config.naming),
            chain,
            registered: RwLock::new(HashSet::new()),
            n1: Mutex::new(
                N1QueryTracker::new()
                    .with_threshold(config.n1_threshold)
                    .with_enabled(config.n1_detection),
            ),
            config,
        }
    }

    /// The chain resolving converters for this database.
    pub fn chain(&self) -> &DialectChain {
        &self.chain
    }

    /// The underlying connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Per-entity metadata built so far.
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// The configuration this database was opened with.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Register a repository for `E`, building its metadata now so
    /// configuration errors surface at start-up.
    pub fn register<E: Entity>(&self) -> Result<&Self> {
        self.cache.mapper::<E>()?;
        self.registered.write().insert(TypeId::of::<E>());
        Ok(self)
    }

    /// Whether [`register`](Self::register) succeeded for `E`.
    pub fn is_registered<E: Entity>(&self) -> bool {
        self.registered.read().contains(&TypeId::of::<E>())
    }

    /// The repository for a registered entity.
    pub fn repository<E: Entity>(&self) -> Result<Repository<'_, E, C>> {
        if !self.is_registered::<E>() {
            return Err(ConfigError::RepositoryNotFound {
                type_name: std::any::type_name::<E>().to_string(),
            }
            .into());
        }
        Ok(Repository::new(self, self.cache.mapper::<E>()?))
    }

    /// Fill the association `name` on every parent with one query.
    ///
    /// Every parent's collection is replaced, so a parent without children
    /// ends up with an empty collection. Configuration errors are raised
    /// before any query is issued.
    #[track_caller]
    pub fn load_association<P: Entity>(&self, parents: &mut [P], name: &str) -> Result<()> {
        let mapper = self.cache.mapper::<P>()?;
        let meta = mapper.metadata();
        let association =
            meta.association(name)
                .ok_or_else(|| ConfigError::UnknownAssociation {
                    entity: meta.type_name().to_string(),
                    association: name.to_string(),
                })?;

        if parents.len() == 1 {
            self.n1
                .lock()
                .record_load(meta.type_name(), association.descriptor.property);
        }

        let ctx = LoadContext {
            connection: &self.connection,
            chain: &self.chain,
            cache: &self.cache,
            registered: &self.registered,
        };
        association
            .loader
            .load(&ctx, &association.descriptor, parents)
    }

    /// Single-parent association loads recorded so far.
    pub fn n1_stats(&self) -> N1Stats {
        self.n1.lock().stats()
    }

    /// Single-parent loads recorded for one association.
    pub fn n1_count(&self, entity: &str, association: &str) -> usize {
        self.n1.lock().count_for(entity, association)
    }

    /// Forget every recorded single-parent load.
    pub fn reset_n1_stats(&self) {
        self.n1.lock().reset();
    }
}

impl<C: Connection> std::fmt::Debug for Database<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("chain", &self.chain.describe())
            .field("cache", &self.cache)
            .field("registered", &self.registered.read().len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
