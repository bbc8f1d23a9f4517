//! Composite (record) values and their wire text.
//!
//! Fields are written in order inside parentheses, separated by commas.
//! NULL fields are empty. Text is double-quoted with backslash and
//! double-quote characters backslash-escaped; booleans are `t`/`f`;
//! numbers are written bare. `("Paris",)` is a two-field record whose
//! second field is NULL.
//!
//! Parsing accepts quoted fields with backslash escapes or doubled quotes,
//! and unquoted raw text. Every non-null field comes back as text; the
//! native field type parses it.

use std::fmt::Write as _;

use relmap_core::{MappingError, Value};

use crate::converter::{ValueConverter, mismatch};

/// Converter for a registered composite type.
#[derive(Debug, Clone)]
pub struct CompositeConverter {
    db_type: String,
}

impl CompositeConverter {
    /// Converter for the database composite type `db_type`.
    pub fn new(db_type: impl Into<String>) -> Self {
        Self {
            db_type: db_type.into(),
        }
    }

    /// The database type name.
    pub fn db_type(&self) -> &str {
        &self.db_type
    }
}

impl ValueConverter for CompositeConverter {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn read_value(&self, raw: &Value) -> Result<Value, MappingError> {
        match raw.untyped() {
            Value::Null => Ok(Value::Null),
            Value::Text(s) => parse_composite(s).map(Value::Record),
            Value::Record(fields) => Ok(Value::Record(fields.clone())),
            other => Err(mismatch("composite text", other)),
        }
    }

    fn write(&self, native: Value) -> Result<Value, MappingError> {
        match native.into_untyped() {
            Value::Null => Ok(Value::Null),
            Value::Record(fields) => Ok(Value::typed(
                self.db_type.clone(),
                Value::Text(encode_composite(&fields)?),
            )),
            other => Err(mismatch("record", &other)),
        }
    }

    fn format_parameter(&self, param: &str) -> String {
        format!("(:{param})::{}", self.db_type)
    }
}

fn malformed(input: &str, reason: impl Into<String>) -> MappingError {
    MappingError::MalformedComposite {
        input: input.to_string(),
        reason: reason.into(),
    }
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        if ch == '\\' || ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
}

fn encode_field(out: &mut String, field: &Value) -> Result<(), MappingError> {
    match field {
        Value::Null => {}
        Value::Typed { value, .. } => encode_field(out, value)?,
        Value::Bool(b) => out.push(if *b { 't' } else { 'f' }),
        Value::TinyInt(_)
        | Value::SmallInt(_)
        | Value::Int(_)
        | Value::BigInt(_)
        | Value::Float(_)
        | Value::Double(_)
        | Value::Decimal(_) => {
            let _ = write!(out, "{field}");
        }
        Value::Text(s) => push_quoted(out, s),
        Value::Date(_)
        | Value::Time(_)
        | Value::Timestamp(_)
        | Value::TimestampTz(_)
        | Value::Uuid(_)
        | Value::Json(_) => push_quoted(out, &field.to_string()),
        Value::Record(inner) => push_quoted(out, &encode_composite(inner)?),
        Value::Bytes(_) | Value::Array(_) | Value::Point(_) => {
            return Err(malformed(
                &field.to_string(),
                format!("{} fields are not supported", field.type_name()),
            ));
        }
    }
    Ok(())
}

/// Render record fields as composite wire text.
///
/// A record needs at least one field: `()` reads back as a single NULL.
pub fn encode_composite(fields: &[Value]) -> Result<String, MappingError> {
    if fields.is_empty() {
        return Err(malformed("()", "a composite value needs at least one field"));
    }
    let mut out = String::from("(");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode_field(&mut out, field)?;
    }
    out.push(')');
    Ok(out)
}

/// Parse composite wire text into record fields (`Text` or `Null`).
pub fn parse_composite(input: &str) -> Result<Vec<Value>, MappingError> {
    let inner = input
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| malformed(input, "expected a parenthesized field list"))?;

    let mut fields = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        let field = match chars.peek() {
            None | Some(',') => Value::Null,
            Some('"') => {
                chars.next();
                let mut buf = String::new();
                loop {
                    match chars.next() {
                        None => return Err(malformed(input, "unterminated quoted field")),
                        Some('\\') => match chars.next() {
                            Some(escaped) => buf.push(escaped),
                            None => return Err(malformed(input, "dangling escape")),
                        },
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                buf.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(ch) => buf.push(ch),
                    }
                }
                Value::Text(buf)
            }
            Some(_) => {
                let mut buf = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == ',' {
                        break;
                    }
                    chars.next();
                    match ch {
                        '\\' => match chars.next() {
                            Some(escaped) => buf.push(escaped),
                            None => return Err(malformed(input, "dangling escape")),
                        },
                        '"' => return Err(malformed(input, "quote inside unquoted field")),
                        _ => buf.push(ch),
                    }
                }
                Value::Text(buf)
            }
        };
        fields.push(field);

        match chars.next() {
            None => break,
            Some(',') => {}
            Some(ch) => return Err(malformed(input, format!("unexpected `{ch}` after field"))),
        }
    }
    Ok(fields)
}
