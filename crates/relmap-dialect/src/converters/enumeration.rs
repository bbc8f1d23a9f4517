use relmap_core::{MappingError, Value};

use crate::converter::{ValueConverter, mismatch};

/// Stores an enum by its literal.
///
/// With a database type name the bound value is typed and the placeholder
/// casts to the named type (`(:status)::user_status`); without one the
/// literal is bound as plain text.
#[derive(Debug, Clone)]
pub struct EnumConverter {
    type_name: &'static str,
    variants: &'static [&'static str],
    db_type: Option<String>,
}

impl EnumConverter {
    /// Plain-text literal storage.
    pub fn plain(type_name: &'static str, variants: &'static [&'static str]) -> Self {
        Self {
            type_name,
            variants,
            db_type: None,
        }
    }

    /// Storage in a named database enum type.
    pub fn named(
        type_name: &'static str,
        variants: &'static [&'static str],
        db_type: impl Into<String>,
    ) -> Self {
        Self {
            type_name,
            variants,
            db_type: Some(db_type.into()),
        }
    }

    /// The database type name, if the enum is stored in a named type.
    pub fn db_type(&self) -> Option<&str> {
        self.db_type.as_deref()
    }

    fn check(&self, literal: String) -> Result<String, MappingError> {
        if self.variants.contains(&literal.as_str()) {
            Ok(literal)
        } else {
            Err(MappingError::InvalidEnumLiteral {
                type_name: self.type_name.to_string(),
                literal,
            })
        }
    }
}

impl ValueConverter for EnumConverter {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn read_value(&self, raw: &Value) -> Result<Value, MappingError> {
        match raw.untyped() {
            Value::Null => Ok(Value::Null),
            Value::Text(s) => self.check(s.clone()).map(Value::Text),
            other => Err(mismatch("enum literal", other)),
        }
    }

    fn write(&self, native: Value) -> Result<Value, MappingError> {
        match native.into_untyped() {
            Value::Null => Ok(Value::Null),
            Value::Text(s) => {
                let literal = Value::Text(self.check(s)?);
                Ok(match &self.db_type {
                    Some(db_type) => Value::typed(db_type.clone(), literal),
                    None => literal,
                })
            }
            other => Err(mismatch("enum literal", &other)),
        }
    }

    fn format_parameter(&self, param: &str) -> String {
        match &self.db_type {
            Some(db_type) => format!("(:{param})::{db_type}"),
            None => format!(":{param}"),
        }
    }
}
