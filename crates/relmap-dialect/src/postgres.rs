//! PostgreSQL: composite types, jsonb, named enums, native uuid and point.

use std::sync::Arc;

use relmap_core::{ConfigError, ScalarKind, TypeInfo, TypeKind};

use crate::converters::{
    CompositeConverter, EnumConverter, JsonConverter, JsonStyle, PgPointConverter, UuidConverter,
    UuidStyle,
};
use crate::dialect::{ConverterRef, Dialect};
use crate::registry::TypeRegistry;

pub(crate) fn pg_composite(db_type: &str) -> ConverterRef {
    Arc::new(CompositeConverter::new(db_type))
}

pub(crate) fn pg_json() -> ConverterRef {
    Arc::new(JsonConverter::new(JsonStyle::PostgresJsonb))
}

pub(crate) fn pg_enum(
    ty: &TypeInfo,
    variants: &'static [&'static str],
    db_type: Option<&str>,
) -> Option<ConverterRef> {
    db_type.map(|name| {
        Arc::new(EnumConverter::named(ty.short_name(), variants, name)) as ConverterRef
    })
}

/// PostgreSQL.
///
/// Enums without a known database type are left to the next link, and so
/// are plain scalars.
#[derive(Debug, Default)]
pub struct PostgresDialect {
    registry: TypeRegistry,
}

impl PostgresDialect {
    /// A Postgres dialect with an empty type registry.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
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
            TypeKind::Uuid => Some(Arc::new(UuidConverter::new(UuidStyle::Native))),
            TypeKind::Point => Some(Arc::new(PgPointConverter)),
            TypeKind::Scalar(ScalarKind::Json) => Some(pg_json()),
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
