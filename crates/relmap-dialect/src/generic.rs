//! The engine-neutral baseline every chain ends with.

use std::sync::Arc;

use relmap_core::{ScalarKind, TypeInfo, TypeKind};

use crate::converter::PassThrough;
use crate::converters::{EnumConverter, JsonConverter, JsonStyle, UuidConverter, UuidStyle};
use crate::dialect::{ConverterRef, Dialect};
use crate::registry::TypeRegistry;

/// Plain SQL: scalars pass through, enums are literals, UUIDs are text.
///
/// Composite types are unsupported and points have no storage here.
#[derive(Debug, Default)]
pub struct GenericDialect {
    registry: TypeRegistry,
}

impl GenericDialect {
    /// The fallback dialect.
    pub fn new() -> Self {
        Self::default()
    }
}

fn scalar_label(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Bool => "bool",
        ScalarKind::SmallInt => "smallint",
        ScalarKind::Int => "integer",
        ScalarKind::BigInt => "bigint",
        ScalarKind::Float => "real",
        ScalarKind::Double => "double",
        ScalarKind::Decimal => "decimal",
        ScalarKind::Text => "text",
        ScalarKind::Bytes => "bytes",
        ScalarKind::Date => "date",
        ScalarKind::Time => "time",
        ScalarKind::Timestamp => "timestamp",
        ScalarKind::TimestampTz => "timestamptz",
        ScalarKind::Json => "json",
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn native_converter(&self, ty: &TypeInfo) -> Option<ConverterRef> {
        match ty.kind() {
            TypeKind::Uuid => Some(Arc::new(UuidConverter::new(UuidStyle::Text))),
            _ => None,
        }
    }

    fn enum_converter(
        &self,
        ty: &TypeInfo,
        variants: &'static [&'static str],
        _db_type: Option<&str>,
    ) -> Option<ConverterRef> {
        Some(Arc::new(EnumConverter::plain(ty.short_name(), variants)))
    }

    fn scalar_converter(&self, kind: ScalarKind) -> Option<ConverterRef> {
        Some(match kind {
            ScalarKind::Json => Arc::new(JsonConverter::new(JsonStyle::Plain)),
            other => Arc::new(PassThrough::new(scalar_label(other))),
        })
    }
}
