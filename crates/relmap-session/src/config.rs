//! Database configuration.

use relmap_core::NamingConvention;
use relmap_dialect::{DEFAULT_SRID, Engine};
use serde::{Deserialize, Serialize};

/// How a [`Database`](crate::Database) maps types and detects N+1 loads.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use relmap_dialect::Engine;
/// use relmap_session::DatabaseConfig;
///
/// let config = DatabaseConfig::from_json(r#"{ "engine": "postgis", "srid": 3857 }"#).unwrap();
/// assert_eq!(config.engine, Engine::Postgis);
/// assert_eq!(config.srid, 3857);
/// assert!(config.n1_detection);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Engine whose dialect chain resolves converters.
    pub engine: Engine,
    /// How property names become column names.
    pub naming: NamingConvention,
    /// Spatial reference id for WKT point literals.
    pub srid: i32,
    /// Whether single-parent association loads are counted.
    pub n1_detection: bool,
    /// Loads of one association before a warning is logged.
    pub n1_threshold: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Generic,
            naming: NamingConvention::SnakeCase,
            srid: DEFAULT_SRID,
            n1_detection: true,
            n1_threshold: 3,
        }
    }
}

impl DatabaseConfig {
    /// Same as [`DatabaseConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Set the engine whose chain resolves converters.
    #[must_use]
    pub const fn engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Set how property names become columns.
    #[must_use]
    pub const fn naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    /// Set the spatial reference id for point literals.
    #[must_use]
    pub const fn srid(mut self, srid: i32) -> Self {
        self.srid = srid;
        self
    }

    /// Turn single-parent load counting on or off.
    #[must_use]
    pub const fn n1_detection(mut self, enabled: bool) -> Self {
        self.n1_detection = enabled;
        self
    }

    /// Set the load count that triggers a warning.
    #[must_use]
    pub const fn n1_threshold(mut self, threshold: usize) -> Self {
        self.n1_threshold = threshold;
        self
    }
}
