//! Native type tokens and conversions to canonical values.
//!
//! Every type that can sit in a column implements [`SqlTyped`]: it names
//! itself with a [`TypeInfo`] token (the key dialects resolve converters by)
//! and converts to and from its canonical [`Value`] form. Converters then
//! translate between that canonical form and what a particular engine stores.
//!
//! Enums, composite types and JSON documents are declared with the
//! [`sql_enum!`](crate::sql_enum), [`composite_type!`](crate::composite_type)
//! and [`json_type!`](crate::json_type) macros.

use std::any::TypeId;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::MappingError;
use crate::value::{Point, Value};

/// Scalars the database client understands without help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Text,
    Bytes,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    /// An untyped JSON document (`serde_json::Value`).
    Json,
}

/// What kind of native type a [`TypeInfo`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A primitive scalar.
    Scalar(ScalarKind),
    /// A UUID; engines disagree on how to store it.
    Uuid,
    /// A 2D point; stored natively or as a spatial geometry.
    Point,
    /// An enumerated type with its database literals.
    Enum {
        variants: &'static [&'static str],
    },
    /// A structured type (composite, JSON document, or a joined entity).
    Struct,
}

/// Stable identity token for a native type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
    declared_db_type: Option<&'static str>,
}

impl TypeInfo {
    fn new<T: 'static>(kind: TypeKind, declared_db_type: Option<&'static str>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind,
            declared_db_type,
        }
    }

    /// Token for a primitive scalar.
    pub fn scalar<T: 'static>(kind: ScalarKind) -> Self {
        Self::new::<T>(TypeKind::Scalar(kind), None)
    }

    /// Token for an enum, with an optional type-level database type name.
    pub fn enumeration<T: 'static>(
        variants: &'static [&'static str],
        declared_db_type: Option<&'static str>,
    ) -> Self {
        Self::new::<T>(TypeKind::Enum { variants }, declared_db_type)
    }

    /// Token for a structured type.
    pub fn structure<T: 'static>() -> Self {
        Self::new::<T>(TypeKind::Struct, None)
    }

    /// Token for a UUID type.
    pub fn uuid<T: 'static>() -> Self {
        Self::new::<T>(TypeKind::Uuid, None)
    }

    /// Token for a point type.
    pub fn point<T: 'static>() -> Self {
        Self::new::<T>(TypeKind::Point, None)
    }

    /// The type's identity.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The last path segment of the type name.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    /// What kind of type this is.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Database type name declared on the type itself, if any.
    pub fn declared_db_type(&self) -> Option<&'static str> {
        self.declared_db_type
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("declared_db_type", &self.declared_db_type)
            .finish()
    }
}

/// A native type that maps to a single column.
pub trait SqlTyped: Sized + Send + Sync + 'static {
    /// Identity token used to resolve a converter.
    fn type_info() -> TypeInfo;

    /// Canonical value for this native value.
    fn to_value(&self) -> Result<Value, MappingError>;

    /// Build the native value from its canonical form.
    fn from_value(value: Value) -> Result<Self, MappingError>;
}

/// An enum stored by literal.
pub trait SqlEnum: Sized + Copy + Send + Sync + 'static {
    /// Database type name declared on the enum, if any.
    const DB_TYPE: Option<&'static str>;
    /// Database literals in declaration order.
    const VARIANTS: &'static [&'static str];

    /// Database literal for this variant.
    fn as_db_str(&self) -> &'static str;

    /// Variant for a database literal.
    fn from_db_str(literal: &str) -> Option<Self>;
}

fn mismatch(expected: &'static str, found: &Value) -> MappingError {
    MappingError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

fn parse_text<T: std::str::FromStr>(expected: &'static str, s: &str) -> Result<T, MappingError> {
    s.trim()
        .parse()
        .map_err(|_| MappingError::invalid_text(expected, s))
}

impl SqlTyped for bool {
    fn type_info() -> TypeInfo {
        TypeInfo::scalar::<Self>(ScalarKind::Bool)
    }
    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Bool(*self))
    }
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value.into_untyped() {
            Value::Bool(b) => Ok(b),
            v @ (Value::TinyInt(_) | Value::SmallInt(_) | Value::Int(_) | Value::BigInt(_)) => {
                Ok(v.as_i64() != Some(0))
            }
            Value::Text(s) => match s.trim() {
                "t" | "true" | "TRUE" | "1" => Ok(true),
                "f" | "false" | "FALSE" | "0" => Ok(false),
                _ => Err(MappingError::invalid_text("boolean", s)),
            },
            other => Err(mismatch("boolean", &other)),
        }
    }
}

macro_rules! impl_sql_typed_int {
    ($($ty:ty => $kind:ident, $variant:ident, $label:literal);* $(;)?) => {
        $(
            impl SqlTyped for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::scalar::<Self>(ScalarKind::$kind)
                }
                fn to_value(&self) -> Result<Value, MappingError> {
                    Ok(Value::$variant(*self))
                }
                fn from_value(value: Value) -> Result<Self, MappingError> {
                    match value.into_untyped() {
                        Value::Text(s) | Value::Decimal(s) => parse_text($label, &s),
                        other => match other.as_i64() {
                            Some(n) => <$ty>::try_from(n)
                                .map_err(|_| MappingError::invalid_text($label, n.to_string())),
                            None => Err(mismatch($label, &other)),
                        },
                    }
                }
            }
        )*
    };
}

impl_sql_typed_int! {
    i16 => SmallInt, SmallInt, "smallint";
    i32 => Int, Int, "integer";
    i64 => BigInt, BigInt, "bigint";
}

macro_rules! impl_sql_typed_float {
    ($($ty:ty => $kind:ident, $variant:ident, $label:literal);* $(;)?) => {
        $(
            impl SqlTyped for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::scalar::<Self>(ScalarKind::$kind)
                }
                fn to_value(&self) -> Result<Value, MappingError> {
                    Ok(Value::$variant(*self))
                }
                #[allow(clippy::cast_possible_truncation)]
                fn from_value(value: Value) -> Result<Self, MappingError> {
                    match value.into_untyped() {
                        Value::Float(f) => Ok(f as $ty),
                        Value::Double(f) => Ok(f as $ty),
                        Value::Text(s) | Value::Decimal(s) => parse_text($label, &s),
                        other => match other.as_i64() {
                            Some(n) => Ok(n as $ty),
                            None => Err(mismatch($label, &other)),
                        },
                    }
                }
            }
        )*
    };
}

impl_sql_typed_float! {
    f32 => Float, Float, "real";
    f64 => Double, Double, "double precision";
}

impl SqlTyped for String {
    fn type_info() -> TypeInfo {
        TypeInfo::scalar::<Self>(ScalarKind::Text)
    }
    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Text(self.clone()))
    }
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value.into_untyped() {
            Value::Text(s) | Value::Decimal(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl SqlTyped for Vec<u8> {
    fn type_info() -> TypeInfo {
        TypeInfo::scalar::<Self>(ScalarKind::Bytes)
    }
    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Bytes(self.clone()))
    }
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value.into_untyped() {
            Value::Bytes(b) => Ok(b),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

macro_rules! impl_sql_typed_temporal {
    ($($ty:ty => $kind:ident, $variant:ident, $label:literal);* $(;)?) => {
        $(
            impl SqlTyped for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::scalar::<Self>(ScalarKind::$kind)
                }
                fn to_value(&self) -> Result<Value, MappingError> {
                    Ok(Value::$variant(*self))
                }
                fn from_value(value: Value) -> Result<Self, MappingError> {
                    match value.into_untyped() {
                        Value::$variant(v) => Ok(v),
                        Value::Text(s) => parse_text($label, &s),
                        other => Err(mismatch($label, &other)),
                    }
                }
            }
        )*
    };
}

impl_sql_typed_temporal! {
    NaiveDate => Date, Date, "date";
    NaiveTime => Time, Time, "time";
    NaiveDateTime => Timestamp, Timestamp, "timestamp";
    DateTime<Utc> => TimestampTz, TimestampTz, "timestamptz";
}

impl SqlTyped for serde_json::Value {
    fn type_info() -> TypeInfo {
        TypeInfo::scalar::<Self>(ScalarKind::Json)
    }
    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Json(self.clone()))
    }
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value.into_untyped() {
            Value::Json(j) => Ok(j),
            Value::Text(s) => Ok(serde_json::from_str(&s)?),
            other => Err(mismatch("json", &other)),
        }
    }
}

impl SqlTyped for Uuid {
    fn type_info() -> TypeInfo {
        TypeInfo::uuid::<Self>()
    }
    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Uuid(*self))
    }
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value.into_untyped() {
            Value::Uuid(u) => Ok(u),
            Value::Text(s) => parse_text("uuid", &s),
            Value::Bytes(b) => {
                Uuid::from_slice(&b).map_err(|_| MappingError::invalid_text("uuid", format!("{b:?}")))
            }
            other => Err(mismatch("uuid", &other)),
        }
    }
}

impl SqlTyped for Point {
    fn type_info() -> TypeInfo {
        TypeInfo::point::<Self>()
    }
    fn to_value(&self) -> Result<Value, MappingError> {
        Ok(Value::Point(*self))
    }
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value.into_untyped() {
            Value::Point(p) => Ok(p),
            other => Err(mismatch("point", &other)),
        }
    }
}

/// Canonical value of an enum variant.
pub fn enum_to_value<T: SqlEnum>(variant: &T) -> Value {
    Value::Text(variant.as_db_str().to_string())
}

/// Parse an enum variant from its canonical value.
pub fn enum_from_value<T: SqlEnum>(value: Value) -> Result<T, MappingError> {
    match value.into_untyped() {
        Value::Text(s) => T::from_db_str(&s).ok_or_else(|| MappingError::InvalidEnumLiteral {
            type_name: std::any::type_name::<T>().to_string(),
            literal: s,
        }),
        other => Err(mismatch("enum literal", &other)),
    }
}

/// One field of a composite type.
///
/// Composite wire text carries every field as text or an empty (NULL) slot,
/// so reading parses from text while writing keeps the native scalar.
pub trait CompositeField: Sized {
    /// Canonical value for the field.
    fn to_field(&self) -> Value;
    /// Build the field from a parsed slot (`Text` or `Null`).
    fn from_field(value: Value) -> Result<Self, MappingError>;
}

macro_rules! impl_composite_field_parsed {
    ($($ty:ty => $label:literal),* $(,)?) => {
        $(
            impl CompositeField for $ty {
                fn to_field(&self) -> Value {
                    Value::from(*self)
                }
                fn from_field(value: Value) -> Result<Self, MappingError> {
                    match value.into_untyped() {
                        Value::Text(s) => parse_text($label, &s),
                        other => <$ty as SqlTyped>::from_value(other),
                    }
                }
            }
        )*
    };
}

impl_composite_field_parsed! {
    i16 => "smallint",
    i32 => "integer",
    i64 => "bigint",
    f64 => "double precision",
}

impl CompositeField for bool {
    fn to_field(&self) -> Value {
        Value::Bool(*self)
    }
    fn from_field(value: Value) -> Result<Self, MappingError> {
        <bool as SqlTyped>::from_value(value)
    }
}

impl CompositeField for String {
    fn to_field(&self) -> Value {
        Value::Text(self.clone())
    }
    fn from_field(value: Value) -> Result<Self, MappingError> {
        <String as SqlTyped>::from_value(value)
    }
}

impl<T: CompositeField> CompositeField for Option<T> {
    fn to_field(&self) -> Value {
        self.as_ref().map_or(Value::Null, CompositeField::to_field)
    }
    fn from_field(value: Value) -> Result<Self, MappingError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_field(value).map(Some)
        }
    }
}

/// Sequential reader over the fields of a canonical record.
#[derive(Debug)]
pub struct RecordFields {
    type_name: &'static str,
    fields: std::vec::IntoIter<Value>,
}

impl RecordFields {
    /// Start reading a `Value::Record`.
    pub fn new(value: Value, type_name: &'static str) -> Result<Self, MappingError> {
        match value.into_untyped() {
            Value::Record(fields) => Ok(Self {
                type_name,
                fields: fields.into_iter(),
            }),
            other => Err(mismatch("record", &other)),
        }
    }

    /// Read the next field; a record with too few fields is malformed.
    pub fn next_field<T: CompositeField>(&mut self, field: &str) -> Result<T, MappingError> {
        let raw = self.fields.next().ok_or_else(|| MappingError::MalformedComposite {
            input: format!("{}.{}", self.type_name, field),
            reason: "record has too few fields".to_string(),
        })?;
        T::from_field(raw).map_err(|e| MappingError::MalformedComposite {
            input: format!("{}.{}", self.type_name, field),
            reason: e.to_string(),
        })
    }

    /// Check every field was read; a record with too many fields is malformed.
    pub fn finish(self) -> Result<(), MappingError> {
        match self.fields.len() {
            0 => Ok(()),
            extra => Err(MappingError::MalformedComposite {
                input: self.type_name.to_string(),
                reason: format!("record has {extra} unexpected trailing field(s)"),
            }),
        }
    }
}

/// Declare an enum stored by literal, optionally naming its database type.
///
/// ```
/// relmap_core::sql_enum! {
///     pub enum UserStatus: "user_status" {
///         Active => "ACTIVE",
///         Suspended => "SUSPENDED",
///     }
/// }
///
/// use relmap_core::SqlEnum;
/// assert_eq!(UserStatus::Active.as_db_str(), "ACTIVE");
/// assert_eq!(UserStatus::DB_TYPE, Some("user_status"));
/// ```
#[macro_export]
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident $(: $db_type:literal)? {
            $($variant:ident => $literal:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::types::SqlEnum for $name {
            const DB_TYPE: ::std::option::Option<&'static str> = $crate::__declared_db_type!($($db_type)?);
            const VARIANTS: &'static [&'static str] = &[$($literal),+];

            fn as_db_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $literal),+
                }
            }

            fn from_db_str(literal: &str) -> ::std::option::Option<Self> {
                match literal {
                    $($literal => ::std::option::Option::Some(Self::$variant),)+
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl $crate::types::SqlTyped for $name {
            fn type_info() -> $crate::types::TypeInfo {
                $crate::types::TypeInfo::enumeration::<Self>(
                    <Self as $crate::types::SqlEnum>::VARIANTS,
                    <Self as $crate::types::SqlEnum>::DB_TYPE,
                )
            }

            fn to_value(&self) -> ::std::result::Result<$crate::value::Value, $crate::error::MappingError> {
                ::std::result::Result::Ok($crate::types::enum_to_value(self))
            }

            fn from_value(value: $crate::value::Value) -> ::std::result::Result<Self, $crate::error::MappingError> {
                $crate::types::enum_from_value(value)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __declared_db_type {
    () => {
        ::std::option::Option::None
    };
    ($db_type:literal) => {
        ::std::option::Option::Some($db_type)
    };
}

/// Declare a struct that maps to a composite (record) column.
///
/// Fields are written in declaration order. Register the type on a dialect
/// chain with its database type name before use.
#[macro_export]
macro_rules! composite_type {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($fvis:vis $field:ident : $fty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($fvis $field: $fty),*
        }

        impl $crate::types::SqlTyped for $name {
            fn type_info() -> $crate::types::TypeInfo {
                $crate::types::TypeInfo::structure::<Self>()
            }

            fn to_value(&self) -> ::std::result::Result<$crate::value::Value, $crate::error::MappingError> {
                ::std::result::Result::Ok($crate::value::Value::Record(::std::vec![
                    $($crate::types::CompositeField::to_field(&self.$field)),*
                ]))
            }

            fn from_value(value: $crate::value::Value) -> ::std::result::Result<Self, $crate::error::MappingError> {
                #[allow(unused_mut)]
                let mut fields = $crate::types::RecordFields::new(value, stringify!($name))?;
                let value = Self {
                    $($field: fields.next_field::<$fty>(stringify!($field))?),*
                };
                fields.finish()?;
                ::std::result::Result::Ok(value)
            }
        }
    };
}

/// Implement [`SqlTyped`] for a serde type stored as a JSON document.
///
/// Register the type on a dialect chain with `register_json` before use.
#[macro_export]
macro_rules! json_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::types::SqlTyped for $ty {
                fn type_info() -> $crate::types::TypeInfo {
                    $crate::types::TypeInfo::structure::<Self>()
                }

                fn to_value(&self) -> ::std::result::Result<$crate::value::Value, $crate::error::MappingError> {
                    ::std::result::Result::Ok($crate::value::Value::Json($crate::__private::serde_json::to_value(self)?))
                }

                fn from_value(value: $crate::value::Value) -> ::std::result::Result<Self, $crate::error::MappingError> {
                    match value.into_untyped() {
                        $crate::value::Value::Json(json) => ::std::result::Result::Ok($crate::__private::serde_json::from_value(json)?),
                        $crate::value::Value::Text(text) => ::std::result::Result::Ok($crate::__private::serde_json::from_str(&text)?),
                        other => ::std::result::Result::Err($crate::error::MappingError::TypeMismatch {
                            expected: "json document",
                            found: other.type_name(),
                        }),
                    }
                }
            }
        )+
    };
}
