//! INSERT rendering.

use relmap_core::{Param, Result, Statement, TypeInfo, Value};
use relmap_dialect::DialectChain;

#[derive(Debug, Clone)]
enum Binding {
    Plain(Value),
    Typed(Value, TypeInfo),
    /// Already written through a converter, with its formatted placeholder.
    Bound { placeholder: String, value: Value },
}

#[derive(Debug, Clone)]
struct Assignment {
    column: String,
    param: String,
    binding: Binding,
}

/// INSERT builder.
///
/// # Example
///
/// ```
/// use relmap_dialect::Engine;
/// use relmap_query::Insert;
///
/// let stmt = Insert::into("users")
///     .value("name", "Ada")
///     .render(&Engine::Generic.chain(4326))
///     .unwrap();
/// assert_eq!(stmt.sql, "INSERT INTO \"users\" (\"name\") VALUES (:name)");
/// ```
#[derive(Debug, Clone)]
pub struct Insert {
    table: String,
    assignments: Vec<Assignment>,
}

impl Insert {
    /// An insert into `table` with no columns yet.
    pub fn into(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            assignments: Vec::new(),
        }
    }

    /// Bind `value` as-is; the parameter is named after the column.
    #[must_use]
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        self.assignments.push(Assignment {
            param: column.clone(),
            column,
            binding: Binding::Plain(value.into()),
        });
        self
    }

    /// Bind `value` through the converter resolved for `ty` at render time.
    #[must_use]
    pub fn typed(mut self, column: impl Into<String>, value: Value, ty: TypeInfo) -> Self {
        let column = column.into();
        self.assignments.push(Assignment {
            param: column.clone(),
            column,
            binding: Binding::Typed(value, ty),
        });
        self
    }

    /// Add a value already written through its converter.
    #[must_use]
    pub fn bound(
        mut self,
        column: impl Into<String>,
        param: impl Into<String>,
        placeholder: impl Into<String>,
        value: Value,
    ) -> Self {
        self.assignments.push(Assignment {
            column: column.into(),
            param: param.into(),
            binding: Binding::Bound {
                placeholder: placeholder.into(),
                value,
            },
        });
        self
    }

    /// Whether no column has been added.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Render SQL and named parameters for `chain`.
    pub fn render(&self, chain: &DialectChain) -> Result<Statement> {
        let mut columns = Vec::with_capacity(self.assignments.len());
        let mut placeholders = Vec::with_capacity(self.assignments.len());
        let mut params = Vec::with_capacity(self.assignments.len());

        for a in &self.assignments {
            columns.push(chain.quote_ident(&a.column));
            let (placeholder, value) = match &a.binding {
                Binding::Plain(value) => (format!(":{}", a.param), value.clone()),
                Binding::Typed(value, ty) => {
                    let converter = chain.converter_for(ty)?;
                    (converter.format_parameter(&a.param), converter.write(value.clone())?)
                }
                Binding::Bound { placeholder, value } => (placeholder.clone(), value.clone()),
            };
            placeholders.push(placeholder);
            params.push(Param::new(a.param.clone(), value));
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", chain.quote_ident(&self.table))
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                chain.quote_ident(&self.table),
                columns.join(", "),
                placeholders.join(", ")
            )
        };
        Ok(Statement::new(sql, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmap_core::{Point, SqlTyped};
    use relmap_dialect::Engine;

    #[test]
    fn test_insert_plain_values() {
        let stmt = Insert::into("users")
            .value("id", 1_i64)
            .value("name", "Ada")
            .render(&Engine::Postgres.chain(4326))
            .unwrap();
        assert_eq!(stmt.sql, "INSERT INTO \"users\" (\"id\", \"name\") VALUES (:id, :name)");
        assert_eq!(stmt.param("name"), Some(&Value::from("Ada")));
    }

    #[test]
    fn test_insert_typed_spatial_value() {
        let stmt = Insert::into("places")
            .typed("location", Value::Point(Point::new(1.0, 2.0)), Point::type_info())
            .render(&Engine::Postgis.chain(4326))
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"places\" (\"location\") VALUES (ST_GeomFromText(:location, 4326))"
        );
        assert_eq!(stmt.param("location"), Some(&Value::from("POINT(1 2)")));
    }

    #[test]
    fn test_insert_prebound_and_default_values() {
        let stmt = Insert::into("users")
            .bound("status", "status", "(:status)::user_status", Value::from("ACTIVE"))
            .render(&Engine::Postgres.chain(4326))
            .unwrap();
        assert!(stmt.sql.ends_with("VALUES ((:status)::user_status)"));

        let empty = Insert::into("users").render(&Engine::Postgres.chain(4326)).unwrap();
        assert_eq!(empty.sql, "INSERT INTO \"users\" DEFAULT VALUES");
    }
}
