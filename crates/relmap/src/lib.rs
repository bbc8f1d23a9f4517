//! Relational-object mapping with per-engine dialect chains.
//!
//! `relmap` maps rows of a relational database onto plain Rust structs and
//! back, without runtime reflection:
//!
//! - Each column-backed property gets a **value converter**, resolved once
//!   through an ordered **dialect chain** (for example PostGIS, then
//!   Postgres, then generic SQL). Enums, composite records, JSON documents,
//!   UUIDs and spatial points are handled by the first link that knows them.
//! - Properties declared with `EntityBuilder::nested` are **nested objects**,
//!   read from columns prefixed `<property>.` so any number of joins flatten
//!   into one result set. A column-backed property whose type no link
//!   resolves is a configuration error, and so is a nested property whose
//!   type a link does resolve.
//! - One-to-many associations are filled for any number of parents with a
//!   **single query**.
//!
//! relmap issues no I/O of its own: a driver implements the synchronous
//! [`Connection`] trait.
//!
//! # Example
//!
//! ```
//! use relmap::prelude::*;
//!
//! relmap::sql_enum! {
//!     pub enum Status: "user_status" {
//!         Active => "ACTIVE",
//!         Banned => "BANNED",
//!     }
//! }
//!
//! impl Default for Status {
//!     fn default() -> Self {
//!         Status::Active
//!     }
//! }
//!
//! #[derive(Debug, Default, Clone)]
//! struct User {
//!     id: i64,
//!     first_name: String,
//!     status: Status,
//! }
//!
//! impl Entity for User {
//!     const TABLE_NAME: &'static str = "users";
//!
//!     fn describe(b: &mut EntityBuilder<Self>) {
//!         b.field("id", |u| &u.id, |u| &mut u.id);
//!         b.field("firstName", |u| &u.first_name, |u| &mut u.first_name);
//!         b.field("status", |u| &u.status, |u| &mut u.status);
//!     }
//! }
//!
//! let cache = MetadataCache::new(
//!     std::sync::Arc::new(Engine::Postgres.chain(4326)),
//!     NamingConvention::SnakeCase,
//! );
//! let mapper = cache.mapper::<User>().unwrap();
//!
//! let row = Row::from_pairs([
//!     ("id", Value::BigInt(1)),
//!     ("first_name", Value::from("Ada")),
//!     ("status", Value::from("BANNED")),
//! ]);
//! let user = mapper.map_row(&row).unwrap();
//! assert_eq!(user.status, Status::Banned);
//!
//! let bound = mapper.bind(&user).unwrap();
//! assert_eq!(bound[2].placeholder, "(:status)::user_status");
//! ```

pub use relmap_core::{
    AssociationDescriptor, Columns, CompositeField, ConfigError, Connection, DatabaseError,
    DatabaseErrorKind, Error, MappingError, NamingConvention, Param, Point, PrefixedRow,
    RecordFields, RelationshipKind, Result, Row, RowAccess, ScalarKind, SqlEnum, SqlTyped,
    Statement, TypeInfo, TypeKind, Value, composite_type, json_type, sql_enum,
};
pub use relmap_dialect::{
    ConverterRef, DEFAULT_SRID, Dialect, DialectChain, Engine, GenericDialect, MySqlDialect,
    PassThrough, PostgisDialect, PostgresDialect, TypeRegistry, ValueConverter,
};
pub use relmap_query::{Condition, Direction, Insert, Join, JoinKind, Op, OrderBy, Select};
pub use relmap_session::{
    BoundValue, Database, DatabaseConfig, Entity, EntityBuilder, EntityMetadata, MetadataCache,
    N1QueryTracker, N1Stats, Repository, RowMapper,
};

/// Converters, for custom dialects.
pub mod converters {
    pub use relmap_dialect::converters::*;
}

/// Common imports.
pub mod prelude {
    pub use crate::{
        Condition, ConfigError, Connection, Database, DatabaseConfig, Dialect, DialectChain,
        Engine, Entity, EntityBuilder, Error, JoinKind, MappingError, MetadataCache,
        NamingConvention, Op, OrderBy, Repository, Result, Row, RowAccess, Select, SqlEnum,
        SqlTyped, Statement, TypeInfo, Value, ValueConverter,
    };
}
