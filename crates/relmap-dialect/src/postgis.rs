//! PostGIS: spatial geometries on top of PostgreSQL.

use std::sync::Arc;

use relmap_core::{ConfigError, TypeInfo, TypeKind};

use crate::converters::WktPointConverter;
use crate::dialect::{ConverterRef, Dialect};
use crate::postgres::{pg_composite, pg_enum, pg_json};
use crate::registry::TypeRegistry;

/// Default spatial reference system (WGS 84).
pub const DEFAULT_SRID: i32 = 4326;

/// PostGIS. Points become geometries bound as WKT; types registered on this
/// link otherwise behave as on PostgreSQL.
#[derive(Debug)]
pub struct PostgisDialect {
    registry: TypeRegistry,
    srid: i32,
}

impl PostgisDialect {
    /// A PostGIS dialect writing points with `srid`.
    pub fn new(srid: i32) -> Self {
        Self {
            registry: TypeRegistry::new(),
            srid,
        }
    }

    /// Spatial reference id for point literals.
    pub fn srid(&self) -> i32 {
        self.srid
    }
}

impl Default for PostgisDialect {
    fn default() -> Self {
        Self::new(DEFAULT_SRID)
    }
}

impl Dialect for PostgisDialect {
    fn name(&self) -> &'static str {
        "postgis"
    }

    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn composite_converter(
        &self,
        _ty: &TypeInfo,
        db_type: &str,
    ) -> Result<ConverterRef, ConfigError> {
        Ok(pg_composite(db_type))
    }

    fn json_converter(&self, _ty: &TypeInfo) -> ConverterRef {
        pg_json()
    }

    fn native_converter(&self, ty: &TypeInfo) -> Option<ConverterRef> {
        match ty.kind() {
            TypeKind::Point => Some(Arc::new(WktPointConverter::new(self.srid))),
            _ => None,
        }
    }

    fn enum_converter(
        &self,
        ty: &TypeInfo,
        variants: &'static [&'static str],
        db_type: Option<&str>,
    ) -> Option<ConverterRef> {
        pg_enum(ty, variants, db_type)
    }
}
