//! Dialects and value converters for relmap.
//!
//! A [`DialectChain`] lists dialects from most to least specific (for
//! example `postgis -> postgres -> generic`). Asking the chain for a
//! converter walks the links in order; each link either answers or
//! delegates. The converter it returns reads storage values into canonical
//! [`Value`](relmap_core::Value)s, writes canonical values into bound
//! parameters, and formats the placeholder text spliced into SQL.
//!
//! Enum, composite and JSON types are registered on the chain at startup.
//! Enums that declare their database type name are also discovered lazily
//! and memoized into the first link that sees them.

pub mod chain;
pub mod converter;
pub mod converters;
pub mod dialect;
pub mod generic;
pub mod mysql;
pub mod postgis;
pub mod postgres;
pub mod registry;

pub use chain::{DialectChain, Engine};
pub use converter::{PassThrough, ValueConverter};
pub use converters::{
    CompositeConverter, EnumConverter, JsonConverter, JsonStyle, PgPointConverter, UuidConverter,
    UuidStyle, WktPointConverter,
};
pub use dialect::{ConverterRef, Dialect, resolve_standard};
pub use generic::GenericDialect;
pub use mysql::MySqlDialect;
pub use postgis::{DEFAULT_SRID, PostgisDialect};
pub use postgres::PostgresDialect;
pub use registry::TypeRegistry;
