//! MySQL: JSON casts, text UUIDs, WKT geometries, backtick quoting.

use std::sync::Arc;

use relmap_core::{ScalarKind, TypeInfo, TypeKind, quote_ident_mysql};

use crate::converters::{
    EnumConverter, JsonConverter, JsonStyle, UuidConverter, UuidStyle, WktPointConverter,
};
use crate::dialect::{ConverterRef, Dialect};
use crate::postgis::DEFAULT_SRID;
use crate::registry::TypeRegistry;

/// MySQL. Composite types are not supported.
#[derive(Debug)]
pub struct MySqlDialect {
    registry: TypeRegistry,
    srid: i32,
}

impl MySqlDialect {
    /// A MySQL dialect writing points with `srid`.
    pub fn new(srid: i32) -> Self {
        Self {
            registry: TypeRegistry::new(),
            srid,
        }
    }
}

impl Default for MySqlDialect {
    fn default() -> Self {
        Self::new(DEFAULT_SRID)
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn quote_ident(&self, name: &str) -> String {
        quote_ident_mysql(name)
    }

    fn json_converter(&self, _ty: &TypeInfo) -> ConverterRef {
        Arc::new(JsonConverter::new(JsonStyle::MySqlCast))
    }

    fn native_converter(&self, ty: &TypeInfo) -> Option<ConverterRef> {
        match ty.kind() {
            TypeKind::Uuid => Some(Arc::new(UuidConverter::new(UuidStyle::Text))),
            TypeKind::Point => Some(Arc::new(WktPointConverter::new(self.srid))),
            TypeKind::Scalar(ScalarKind::Json) => {
                Some(Arc::new(JsonConverter::new(JsonStyle::MySqlCast)))
            }
            _ => None,
        }
    }

    fn enum_converter(
        &self,
        ty: &TypeInfo,
        variants: &'static [&'static str],
        _db_type: Option<&str>,
    ) -> Option<ConverterRef> {
        // ENUM columns take the literal itself.
        Some(Arc::new(EnumConverter::plain(ty.short_name(), variants)))
    }
}
