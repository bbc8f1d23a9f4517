//! The dialect contract and the standard resolution order.

use std::fmt;
use std::sync::Arc;

use relmap_core::{ConfigError, ScalarKind, TypeInfo, TypeKind, quote_ident};

use crate::converter::ValueConverter;
use crate::converters::{JsonConverter, JsonStyle};
use crate::registry::TypeRegistry;

/// A shared converter handle.
pub type ConverterRef = Arc<dyn ValueConverter>;

/// One engine's (or extension's) knowledge of how to store types.
///
/// A dialect only answers for what it knows; anything it leaves unresolved
/// falls through to the next link of a [`DialectChain`](crate::DialectChain).
/// The hooks below are the per-dialect pieces; [`Dialect::resolve`] combines
/// them in a fixed order.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Engine name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Types registered on this dialect.
    fn registry(&self) -> &TypeRegistry;

    /// Quote an identifier for this engine.
    fn quote_ident(&self, name: &str) -> String {
        quote_ident(name)
    }

    /// Converter for a composite type registered under `db_type`.
    fn composite_converter(
        &self,
        ty: &TypeInfo,
        _db_type: &str,
    ) -> Result<ConverterRef, ConfigError> {
        Err(ConfigError::Unsupported {
            engine: self.name(),
            feature: "composite types",
            type_name: ty.name().to_string(),
        })
    }

    /// Converter for a type registered as JSON.
    fn json_converter(&self, _ty: &TypeInfo) -> ConverterRef {
        Arc::new(JsonConverter::new(JsonStyle::Plain))
    }

    /// Engine-native handling for UUIDs, points and untyped JSON.
    fn native_converter(&self, _ty: &TypeInfo) -> Option<ConverterRef> {
        None
    }

    /// Converter for an enum, given its database type name when known.
    fn enum_converter(
        &self,
        _ty: &TypeInfo,
        _variants: &'static [&'static str],
        _db_type: Option<&str>,
    ) -> Option<ConverterRef> {
        None
    }

    /// Converter for a scalar the client understands as-is.
    fn scalar_converter(&self, _kind: ScalarKind) -> Option<ConverterRef> {
        None
    }

    /// Resolve a converter for `ty`, or `Ok(None)` to delegate.
    fn resolve(&self, ty: &TypeInfo) -> Result<Option<ConverterRef>, ConfigError> {
        resolve_standard(self, ty)
    }
}

/// The standard resolution order shared by every dialect:
///
/// 1. a registered composite type (an error if the engine has none),
/// 2. a registered JSON type,
/// 3. native handling (UUID, point, untyped JSON),
/// 4. an enum, by registered name or by the name the type declares, which
///    is memoized into the registry on first sight,
/// 5. a scalar the client passes through,
/// 6. otherwise nothing, so the next link gets a turn.
pub fn resolve_standard<D: Dialect + ?Sized>(
    dialect: &D,
    ty: &TypeInfo,
) -> Result<Option<ConverterRef>, ConfigError> {
    let registry = dialect.registry();

    if let Some(db_type) = registry.composite_type(ty.id()) {
        return dialect.composite_converter(ty, &db_type).map(Some);
    }

    if registry.is_json(ty.id()) {
        return Ok(Some(dialect.json_converter(ty)));
    }

    if let Some(converter) = dialect.native_converter(ty) {
        return Ok(Some(converter));
    }

    match ty.kind() {
        TypeKind::Enum { variants } => {
            let db_type = registry.enum_type(ty.id()).or_else(|| {
                ty.declared_db_type().map(|declared| {
                    let name = registry.memoize_enum(ty.id(), declared);
                    tracing::debug!(
                        target: "relmap::dialect",
                        dialect = dialect.name(),
                        type_name = ty.short_name(),
                        db_type = %name,
                        "Memoized enum database type"
                    );
                    name
                })
            });
            Ok(dialect.enum_converter(ty, variants, db_type.as_deref()))
        }
        TypeKind::Scalar(kind) => Ok(dialect.scalar_converter(kind)),
        TypeKind::Uuid | TypeKind::Point | TypeKind::Struct => Ok(None),
    }
}
