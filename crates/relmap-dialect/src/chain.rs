//! Ordered dialect chains.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use relmap_core::{ConfigError, TypeInfo, TypeKind};
use serde::{Deserialize, Serialize};

use crate::dialect::{ConverterRef, Dialect};
use crate::generic::GenericDialect;
use crate::mysql::MySqlDialect;
use crate::postgis::PostgisDialect;
use crate::postgres::PostgresDialect;

/// Dialects consulted in priority order, most specific first.
///
/// The first link that resolves a type wins; a link that returns nothing
/// delegates to the next. Registrations made through the chain land on the
/// first link.
#[derive(Clone)]
pub struct DialectChain {
    links: Vec<Arc<dyn Dialect>>,
}

impl DialectChain {
    /// Build a chain from links in priority order.
    ///
    /// An empty list yields a chain holding only the generic dialect.
    pub fn new(links: impl IntoIterator<Item = Arc<dyn Dialect>>) -> Self {
        let mut links: Vec<_> = links.into_iter().collect();
        if links.is_empty() {
            links.push(Arc::new(GenericDialect::new()));
        }
        Self { links }
    }

    /// The standard chain for an engine.
    pub fn for_engine(engine: Engine, srid: i32) -> Self {
        let links: Vec<Arc<dyn Dialect>> = match engine {
            Engine::Generic => vec![Arc::new(GenericDialect::new())],
            Engine::Postgres => vec![
                Arc::new(PostgresDialect::new()),
                Arc::new(GenericDialect::new()),
            ],
            Engine::Postgis => vec![
                Arc::new(PostgisDialect::new(srid)),
                Arc::new(PostgresDialect::new()),
                Arc::new(GenericDialect::new()),
            ],
            Engine::MySql => vec![
                Arc::new(MySqlDialect::new(srid)),
                Arc::new(GenericDialect::new()),
            ],
        };
        Self::new(links)
    }

    /// Links in priority order.
    pub fn links(&self) -> &[Arc<dyn Dialect>] {
        &self.links
    }

    fn head(&self) -> &dyn Dialect {
        self.links[0].as_ref()
    }

    /// Link names joined in order, e.g. `postgis -> postgres -> generic`.
    pub fn describe(&self) -> String {
        self.links
            .iter()
            .map(|link| link.name())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Resolve a converter for `ty`; `Ok(None)` when no link handles it.
    pub fn resolve(&self, ty: &TypeInfo) -> Result<Option<ConverterRef>, ConfigError> {
        for link in &self.links {
            if let Some(converter) = link.resolve(ty)? {
                tracing::trace!(
                    target: "relmap::dialect",
                    dialect = link.name(),
                    type_name = ty.short_name(),
                    converter = converter.name(),
                    "Resolved converter"
                );
                return Ok(Some(converter));
            }
        }
        Ok(None)
    }

    /// Resolve a converter for a type that must map to a column.
    pub fn converter_for(&self, ty: &TypeInfo) -> Result<ConverterRef, ConfigError> {
        self.resolve(ty)?.ok_or_else(|| match ty.kind() {
            TypeKind::Struct => ConfigError::TypeNotConfigured {
                type_name: ty.name().to_string(),
            },
            _ => ConfigError::UnsupportedType {
                type_name: ty.name().to_string(),
                chain: self.describe(),
            },
        })
    }

    /// Converter for a registered composite type.
    pub fn composite_converter(&self, ty: &TypeInfo) -> Result<ConverterRef, ConfigError> {
        for link in &self.links {
            if let Some(db_type) = link.registry().composite_type(ty.id()) {
                return link.composite_converter(ty, &db_type);
            }
        }
        Err(ConfigError::TypeNotConfigured {
            type_name: ty.name().to_string(),
        })
    }

    /// Converter for a registered JSON type.
    pub fn json_converter(&self, ty: &TypeInfo) -> Result<ConverterRef, ConfigError> {
        self.links
            .iter()
            .find(|link| link.registry().is_json(ty.id()))
            .map(|link| link.json_converter(ty))
            .ok_or_else(|| ConfigError::TypeNotConfigured {
                type_name: ty.name().to_string(),
            })
    }

    /// Store enum `T` in the database type `db_type`.
    pub fn register_enum<T: 'static>(&self, db_type: impl Into<String>) -> &Self {
        self.head().registry().register_enum(TypeId::of::<T>(), db_type);
        self
    }

    /// Store `T` in the database composite type `db_type`.
    pub fn register_composite<T: 'static>(&self, db_type: impl Into<String>) -> &Self {
        self.head()
            .registry()
            .register_composite(TypeId::of::<T>(), db_type);
        self
    }

    /// Store `T` as a JSON document.
    pub fn register_json<T: 'static>(&self) -> &Self {
        self.head().registry().register_json(TypeId::of::<T>());
        self
    }

    /// Quote an identifier the way the most specific link does.
    pub fn quote_ident(&self, name: &str) -> String {
        self.head().quote_ident(name)
    }
}

impl fmt::Debug for DialectChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DialectChain").field(&self.describe()).finish()
    }
}

impl Default for DialectChain {
    fn default() -> Self {
        Self::for_engine(Engine::Generic, crate::postgis::DEFAULT_SRID)
    }
}

/// Supported engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    #[default]
    Generic,
    Postgres,
    /// PostgreSQL with the PostGIS extension.
    Postgis,
    #[serde(rename = "mysql")]
    MySql,
}

impl Engine {
    /// The lowercase name used in configuration.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Engine::Generic => "generic",
            Engine::Postgres => "postgres",
            Engine::Postgis => "postgis",
            Engine::MySql => "mysql",
        }
    }

    /// The standard chain for this engine.
    pub fn chain(self, srid: i32) -> DialectChain {
        DialectChain::for_engine(self, srid)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
