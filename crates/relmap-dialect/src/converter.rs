//! The value converter contract.

use std::fmt;

use relmap_core::{MappingError, RowAccess, Value};

/// Bidirectional conversion for one semantic type on one engine.
///
/// `read_value` turns what the client hands back into the canonical value a
/// native type is built from; `write` turns a canonical value into what the
/// engine accepts as a bound parameter; `format_parameter` gives the exact
/// text spliced into SQL in place of the placeholder.
///
/// Converters hold only immutable construction parameters and are shared
/// freely across threads.
pub trait ValueConverter: Send + Sync + fmt::Debug {
    /// Short name, for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Storage value -> canonical value. NULL always reads as NULL.
    fn read_value(&self, raw: &Value) -> Result<Value, MappingError>;

    /// Canonical value -> bound value. NULL always writes as NULL.
    fn write(&self, native: Value) -> Result<Value, MappingError>;

    /// Placeholder text for a bound parameter named `param`.
    fn format_parameter(&self, param: &str) -> String {
        format!(":{param}")
    }

    /// Read `column` from a row; `Ok(None)` when the row has no such column.
    fn read(&self, row: &dyn RowAccess, column: &str) -> Result<Option<Value>, MappingError> {
        row.value(column).map(|raw| self.read_value(raw)).transpose()
    }
}

/// Hands values through untouched; for scalars the client understands.
#[derive(Debug, Clone, Copy)]
pub struct PassThrough {
    label: &'static str,
}

impl PassThrough {
    /// Create a pass-through converter labelled for diagnostics.
    pub const fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl ValueConverter for PassThrough {
    fn name(&self) -> &'static str {
        self.label
    }

    fn read_value(&self, raw: &Value) -> Result<Value, MappingError> {
        Ok(raw.untyped().clone())
    }

    fn write(&self, native: Value) -> Result<Value, MappingError> {
        Ok(native)
    }
}

pub(crate) fn mismatch(expected: &'static str, found: &Value) -> MappingError {
    MappingError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmap_core::Row;

    #[test]
    fn test_passthrough_round_trip() {
        let c = PassThrough::new("bigint");
        for v in [Value::BigInt(9), Value::Null, Value::from("x")] {
            assert_eq!(c.read_value(&c.write(v.clone()).unwrap()).unwrap(), v);
        }
        assert_eq!(c.format_parameter("id"), ":id");
    }

    #[test]
    fn test_read_distinguishes_absent_from_null() {
        let c = PassThrough::new("text");
        let row = Row::from_pairs([("name", Value::Null)]);
        assert_eq!(c.read(&row, "name").unwrap(), Some(Value::Null));
        assert_eq!(c.read(&row, "missing").unwrap(), None);
    }
}
