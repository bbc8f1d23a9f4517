//! Error types shared by every relmap crate.
//!
//! Errors fall into three families:
//!
//! - [`ConfigError`]: the program or its static registrations are wrong
//!   (unregistered types, unknown associations, unsupported engine features).
//!   These are never retried.
//! - [`MappingError`]: a single value or row could not be converted
//!   (malformed composite text, unknown enum literal, type mismatch).
//! - [`DatabaseError`]: a fault raised by the underlying database client,
//!   wrapped so callers see one error type regardless of the engine.

use std::fmt;

use thiserror::Error;

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned by relmap operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Static configuration is wrong.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A value or row could not be converted.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// The database client reported a fault.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl Error {
    /// Whether this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Whether this is a mapping error.
    pub fn is_mapping(&self) -> bool {
        matches!(self, Error::Mapping(_))
    }

    /// Whether this error came from the database client.
    pub fn is_database(&self) -> bool {
        matches!(self, Error::Database(_))
    }
}

/// Programmer or registration mistakes, surfaced as soon as they are detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A composite/JSON converter was requested for a type nobody registered.
    #[error("type `{type_name}` is not configured: register it as a composite or JSON type")]
    TypeNotConfigured { type_name: String },

    /// No dialect in the chain can map this type to a column.
    #[error("no dialect in chain [{chain}] can map type `{type_name}` to a column")]
    UnsupportedType { type_name: String, chain: String },

    /// The engine cannot express a feature (e.g. composite types on MySQL).
    #[error("{engine} does not support {feature} (type `{type_name}`)")]
    Unsupported {
        engine: &'static str,
        feature: &'static str,
        type_name: String,
    },

    /// A nested property's type also resolves to a column converter.
    #[error(
        "property `{property}` is declared nested but type `{type_name}` is registered as a column type"
    )]
    AmbiguousMapping { type_name: String, property: String },

    /// A property name does not exist on the entity.
    #[error("entity `{entity}` has no property `{property}`")]
    UnknownProperty { entity: String, property: String },

    /// An association name does not exist on the entity.
    #[error("entity `{entity}` declares no association `{association}`")]
    UnknownAssociation { entity: String, association: String },

    /// An association declaration is incomplete or points at a bad property.
    #[error("association `{entity}.{association}` is misconfigured: {reason}")]
    AssociationMisconfigured {
        entity: String,
        association: String,
        reason: String,
    },

    /// No repository was registered for the entity type.
    #[error("no repository registered for entity `{type_name}`")]
    RepositoryNotFound { type_name: String },

    /// The entity has no simple property carrying its identifier.
    #[error("entity `{entity}` has no identifier property `{property}`")]
    MissingIdProperty { entity: String, property: String },

    /// A type nests itself, directly or transitively.
    #[error("type `{type_name}` nests itself; recursive row mapping is not supported")]
    RecursiveNesting { type_name: String },

    /// A cache entry was stored under the wrong type.
    #[error("metadata cache entry for `{type_name}` has an unexpected type")]
    CacheTypeMismatch { type_name: String },
}

/// Failures converting a single value or row.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The value variant is not convertible to the requested native type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The literal is not a variant of the enum.
    #[error("`{literal}` is not a valid literal for enum `{type_name}`")]
    InvalidEnumLiteral { type_name: String, literal: String },

    /// Composite wire text could not be parsed or built.
    #[error("malformed composite value `{input}`: {reason}")]
    MalformedComposite { input: String, reason: String },

    /// Spatial text could not be parsed.
    #[error("malformed spatial value `{input}`")]
    MalformedSpatial { input: String },

    /// JSON encoding or decoding failed.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Text could not be parsed into the expected scalar.
    #[error("cannot parse `{input}` as {expected}")]
    InvalidText {
        expected: &'static str,
        input: String,
    },

    /// A conversion failed while reading or writing a specific property.
    #[error("{entity}.{property} (column `{column}`): {source}")]
    Property {
        entity: String,
        property: String,
        column: String,
        #[source]
        source: Box<MappingError>,
    },
}

impl MappingError {
    /// Wrap this error with the property and column it occurred on.
    #[must_use]
    pub fn at_property(
        self,
        entity: impl Into<String>,
        property: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        MappingError::Property {
            entity: entity.into(),
            property: property.into(),
            column: column.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a text parse failure.
    pub fn invalid_text(expected: &'static str, input: impl Into<String>) -> Self {
        MappingError::InvalidText {
            expected,
            input: input.into(),
        }
    }
}

/// Category of a database client failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseErrorKind {
    /// Could not reach or lost the server.
    Connection,
    /// A constraint (unique, foreign key, check) was violated.
    Constraint,
    /// The statement was rejected or failed to execute.
    Query,
    /// Anything else.
    Other,
}

impl fmt::Display for DatabaseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DatabaseErrorKind::Connection => "connection",
            DatabaseErrorKind::Constraint => "constraint",
            DatabaseErrorKind::Query => "query",
            DatabaseErrorKind::Other => "database",
        };
        f.write_str(s)
    }
}

/// A fault raised by the database client beneath relmap.
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct DatabaseError {
    /// What went wrong.
    pub kind: DatabaseErrorKind,
    /// Driver-supplied message.
    pub message: String,
    /// The driver's original error, when available.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DatabaseError {
    /// Create a database error without an underlying source.
    pub fn new(kind: DatabaseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the driver's original error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}
