use relmap_core::{MappingError, Value};

use crate::converter::{ValueConverter, mismatch};

/// How an engine wants JSON documents bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonStyle {
    /// Bound as text, no cast.
    Plain,
    /// Bound as typed text, cast with `(:p)::jsonb`.
    PostgresJsonb,
    /// Bound as text, cast with `CAST(:p AS JSON)`.
    MySqlCast,
}

/// Converter for JSON documents.
#[derive(Debug, Clone, Copy)]
pub struct JsonConverter {
    style: JsonStyle,
}

impl JsonConverter {
    /// A converter writing JSON in `style`.
    pub const fn new(style: JsonStyle) -> Self {
        Self { style }
    }

    /// The wire form this converter writes.
    pub const fn style(&self) -> JsonStyle {
        self.style
    }
}

impl ValueConverter for JsonConverter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn read_value(&self, raw: &Value) -> Result<Value, MappingError> {
        match raw.untyped() {
            Value::Null => Ok(Value::Null),
            Value::Json(doc) => Ok(Value::Json(doc.clone())),
            Value::Text(text) => Ok(Value::Json(serde_json::from_str(text)?)),
            Value::Bytes(bytes) => Ok(Value::Json(serde_json::from_slice(bytes)?)),
            other => Err(mismatch("json document", other)),
        }
    }

    fn write(&self, native: Value) -> Result<Value, MappingError> {
        let doc = match native.into_untyped() {
            Value::Null => return Ok(Value::Null),
            Value::Json(doc) => doc,
            other => return Err(mismatch("json document", &other)),
        };
        let text = Value::Text(serde_json::to_string(&doc)?);
        Ok(match self.style {
            JsonStyle::PostgresJsonb => Value::typed("jsonb", text),
            JsonStyle::Plain | JsonStyle::MySqlCast => text,
        })
    }

    fn format_parameter(&self, param: &str) -> String {
        match self.style {
            JsonStyle::Plain => format!(":{param}"),
            JsonStyle::PostgresJsonb => format!("(:{param})::jsonb"),
            JsonStyle::MySqlCast => format!("CAST(:{param} AS JSON)"),
        }
    }
}
