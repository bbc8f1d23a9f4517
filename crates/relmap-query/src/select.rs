//! SELECT rendering with joined, prefix-aliased columns.

use relmap_core::{Param, Result, Statement};
use relmap_dialect::DialectChain;
use serde::{Deserialize, Serialize};

use crate::clause::{Condition, Direction, OrderBy};

/// Join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    #[default]
    Left,
}

impl JoinKind {
    const fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// A joined table feeding a nested property.
///
/// The joined table is aliased by the property path and its columns are
/// selected as `"<path>.<column>"`, the names a column-prefixed row view
/// expects. Nested joins use dotted paths (`group.owner`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub path: String,
    pub local_column: String,
    pub remote_column: String,
    pub columns: Vec<String>,
}

impl Join {
    /// Join `table` under the property path `path`.
    pub fn new(kind: JoinKind, table: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            path: path.into(),
            local_column: String::new(),
            remote_column: String::new(),
            columns: Vec::new(),
        }
    }

    /// Join condition: `<parent>.<local> = <path>.<remote>`.
    #[must_use]
    pub fn on(mut self, local_column: impl Into<String>, remote_column: impl Into<String>) -> Self {
        self.local_column = local_column.into();
        self.remote_column = remote_column.into();
        self
    }

    /// Columns of the joined table to select.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Alias of the table this join hangs off: the parent path, or the root.
    fn parent<'a>(&'a self, root: &'a str) -> &'a str {
        self.path.rsplit_once('.').map_or(root, |(parent, _)| parent)
    }
}

/// SELECT builder.
///
/// # Example
///
/// ```
/// use relmap_dialect::Engine;
/// use relmap_query::{Condition, Join, JoinKind, Select};
///
/// let stmt = Select::from("users")
///     .columns(["id", "name"])
///     .join(Join::new(JoinKind::Left, "groups", "group").on("group_id", "id").columns(["id"]))
///     .filter(Condition::eq("id", 7_i64))
///     .render(&Engine::Postgres.chain(4326))
///     .unwrap();
/// assert_eq!(
///     stmt.sql,
///     "SELECT \"users\".\"id\" AS \"id\", \"users\".\"name\" AS \"name\", \
///      \"group\".\"id\" AS \"group.id\" FROM \"users\" \
///      LEFT JOIN \"groups\" AS \"group\" ON \"users\".\"group_id\" = \"group\".\"id\" \
///      WHERE \"users\".\"id\" = :p1"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    conditions: Vec<Condition>,
    order_by: Vec<OrderBy>,
    joins: Vec<Join>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    /// Select from `table`.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Root-table columns to select; none means `*`.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a condition, ANDed with the others.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Append an ordering term.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Append a join.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Cap the number of rows returned.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip `offset` rows.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The table selected from.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Filters in the order they were added.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Joins in the order they were added.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Render SQL and named parameters for `chain`.
    pub fn render(&self, chain: &DialectChain) -> Result<Statement> {
        let q = |name: &str| chain.quote_ident(name);
        let root = q(&self.table);

        let mut select_list: Vec<String> = if self.columns.is_empty() {
            vec![format!("{root}.*")]
        } else {
            self.columns
                .iter()
                .map(|c| format!("{root}.{} AS {}", q(c), q(c)))
                .collect()
        };
        for join in &self.joins {
            let alias = q(&join.path);
            select_list.extend(
                join.columns
                    .iter()
                    .map(|c| format!("{alias}.{} AS {}", q(c), q(&format!("{}.{c}", join.path)))),
            );
        }

        let mut sql = format!("SELECT {} FROM {root}", select_list.join(", "));

        for join in &self.joins {
            let parent = join.parent(&self.table);
            sql.push_str(&format!(
                " {} {} AS {} ON {}.{} = {}.{}",
                join.kind.as_sql(),
                q(&join.table),
                q(&join.path),
                q(parent),
                q(&join.local_column),
                q(&join.path),
                q(&join.remote_column),
            ));
        }

        let mut params: Vec<Param> = Vec::new();
        if !self.conditions.is_empty() {
            let mut terms = Vec::with_capacity(self.conditions.len());
            for condition in &self.conditions {
                terms.push(condition.render(chain, &self.table, &mut params)?);
            }
            sql.push_str(" WHERE ");
            sql.push_str(&terms.join(" AND "));
        }

        if !self.order_by.is_empty() {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    format!("{root}.{} {dir}", q(&o.column))
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        tracing::trace!(target: "relmap::query", sql = %sql, params = params.len(), "Rendered SELECT");
        Ok(Statement::new(sql, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::Op;
    use relmap_core::{SqlTyped, Value};
    use relmap_dialect::Engine;

    relmap_core::sql_enum! {
        enum Status: "user_status" {
            Active => "ACTIVE",
            Banned => "BANNED",
        }
    }

    fn pg() -> DialectChain {
        Engine::Postgres.chain(4326)
    }

    #[test]
    fn test_select_star_without_columns() {
        let stmt = Select::from("users").render(&pg()).unwrap();
        assert_eq!(stmt.sql, "SELECT \"users\".* FROM \"users\"");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_conditions_are_anded_and_numbered() {
        let stmt = Select::from("users")
            .columns(["id"])
            .filter(Condition::new("age", Op::Ge, 18_i32))
            .filter(Condition::new("name", Op::Like, "A%"))
            .filter(Condition::is_not_null("email"))
            .render(&pg())
            .unwrap();
        assert!(stmt.sql.ends_with(
            "WHERE \"users\".\"age\" >= :p1 AND \"users\".\"name\" LIKE :p2 AND \"users\".\"email\" IS NOT NULL"
        ));
        assert_eq!(stmt.param("p1"), Some(&Value::Int(18)));
        assert_eq!(stmt.param("p2"), Some(&Value::from("A%")));
    }

    #[test]
    fn test_in_list_expands_placeholders() {
        let stmt = Select::from("posts")
            .filter(Condition::is_in("user_id", [Value::BigInt(1), Value::BigInt(2)]))
            .render(&pg())
            .unwrap();
        assert!(stmt.sql.ends_with("WHERE \"posts\".\"user_id\" IN (:p1_0, :p1_1)"));
        assert_eq!(stmt.params.len(), 2);
        assert_eq!(stmt.param("p1_1"), Some(&Value::BigInt(2)));
    }

    #[test]
    fn test_empty_in_list_is_constant_false() {
        let stmt = Select::from("posts")
            .filter(Condition::is_in("user_id", Vec::new()))
            .render(&pg())
            .unwrap();
        assert!(stmt.sql.ends_with("WHERE 1 = 0"));
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_typed_condition_uses_converter() {
        let stmt = Select::from("users")
            .filter(Condition::typed("status", Op::Eq, &Status::Active).unwrap())
            .render(&pg())
            .unwrap();
        assert!(stmt.sql.ends_with("\"users\".\"status\" = (:p1)::user_status"));
        assert_eq!(
            stmt.param("p1"),
            Some(&Value::typed("user_status", Value::from("ACTIVE")))
        );
        assert_eq!(Status::type_info().short_name(), "Status");
    }

    #[test]
    fn test_nested_join_path_hangs_off_parent_alias() {
        let stmt = Select::from("users")
            .columns(["id"])
            .join(Join::new(JoinKind::Left, "groups", "group").on("group_id", "id").columns(["id"]))
            .join(
                Join::new(JoinKind::Inner, "users", "group.owner")
                    .on("owner_id", "id")
                    .columns(["name"]),
            )
            .render(&pg())
            .unwrap();
        assert!(stmt.sql.contains("\"group.owner\".\"name\" AS \"group.owner.name\""));
        assert!(stmt.sql.contains(
            "INNER JOIN \"users\" AS \"group.owner\" ON \"group\".\"owner_id\" = \"group.owner\".\"id\""
        ));
    }

    #[test]
    fn test_order_limit_offset_and_mysql_quoting() {
        let stmt = Select::from("users")
            .columns(["id"])
            .order_by(OrderBy::desc("created_at"))
            .order_by(OrderBy::asc("id"))
            .limit(10)
            .offset(20)
            .render(&Engine::MySql.chain(4326))
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT `users`.`id` AS `id` FROM `users` ORDER BY `users`.`created_at` DESC, `users`.`id` ASC LIMIT 10 OFFSET 20"
        );
    }
}
