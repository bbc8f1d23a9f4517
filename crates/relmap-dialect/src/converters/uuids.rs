use relmap_core::{MappingError, Value};
use uuid::Uuid;

use crate::converter::{ValueConverter, mismatch};

/// How an engine stores UUIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidStyle {
    /// A native `uuid` column.
    Native,
    /// Hyphenated text (`CHAR(36)`).
    Text,
}

/// Converter for UUID columns.
#[derive(Debug, Clone, Copy)]
pub struct UuidConverter {
    style: UuidStyle,
}

impl UuidConverter {
    /// A converter writing UUIDs in `style`.
    pub const fn new(style: UuidStyle) -> Self {
        Self { style }
    }
}

fn parse(raw: &Value) -> Result<Uuid, MappingError> {
    match raw {
        Value::Uuid(u) => Ok(*u),
        Value::Text(s) => Uuid::parse_str(s.trim()).map_err(|_| MappingError::invalid_text("uuid", s)),
        Value::Bytes(b) => {
            Uuid::from_slice(b).map_err(|_| MappingError::invalid_text("uuid", format!("{b:02x?}")))
        }
        other => Err(mismatch("uuid", other)),
    }
}

impl ValueConverter for UuidConverter {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn read_value(&self, raw: &Value) -> Result<Value, MappingError> {
        match raw.untyped() {
            Value::Null => Ok(Value::Null),
            other => parse(other).map(Value::Uuid),
        }
    }

    fn write(&self, native: Value) -> Result<Value, MappingError> {
        let native = native.into_untyped();
        if native.is_null() {
            return Ok(Value::Null);
        }
        let id = parse(&native)?;
        Ok(match self.style {
            UuidStyle::Native => Value::Uuid(id),
            UuidStyle::Text => Value::Text(id.hyphenated().to_string()),
        })
    }

    fn format_parameter(&self, param: &str) -> String {
        match self.style {
            UuidStyle::Native => format!("(:{param})::uuid"),
            UuidStyle::Text => format!(":{param}"),
        }
    }
}
