//! Core types and traits for relmap.
//!
//! `relmap-core` is the **foundation layer** for the workspace. It defines the
//! data model every other crate shares.
//!
//! # Role In The Architecture
//!
//! - **Data model**: `Value`, `Row`, and the column-prefixed `PrefixedRow` view
//!   represent query inputs/outputs.
//! - **Type tokens**: `TypeInfo` and `SqlTyped` identify native types so dialects
//!   can resolve a converter per type without runtime reflection.
//! - **Boundary**: `Connection` is the synchronous contract drivers implement.
//! - **Errors**: one `Error` type with configuration, mapping and database families.
//!
//! # Who Uses This Crate
//!
//! - `relmap-dialect` resolves converters from `TypeInfo` and converts `Value`s.
//! - `relmap-query` renders statements into `Statement` + `Param`s.
//! - `relmap-session` maps `Row`s into entities and loads associations.

pub mod connection;
pub mod error;
pub mod identifiers;
pub mod relationship;
pub mod row;
pub mod types;
pub mod value;

pub use connection::{Connection, Param, Statement};
pub use error::{
    ConfigError, DatabaseError, DatabaseErrorKind, Error, MappingError, Result,
};
pub use identifiers::{
    NamingConvention, is_valid_property_name, quote_ident, quote_ident_mysql, to_column_name,
    to_property_name,
};
pub use relationship::{AssociationDescriptor, RelationshipKind};
pub use row::{Columns, PrefixedRow, Row, RowAccess};
pub use types::{
    CompositeField, RecordFields, ScalarKind, SqlEnum, SqlTyped, TypeInfo, TypeKind,
};
pub use value::{Point, Value};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
