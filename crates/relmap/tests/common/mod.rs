//! Shared fixtures: an in-memory connection that records every statement
//! and a small blog schema.

#![allow(dead_code)]

use std::collections::HashMap;

use parking_lot::Mutex;
use relmap::prelude::*;

/// Serves fixed rows per table and records every statement it receives.
///
/// Rows are returned unfiltered, so tests control exactly what a query
/// "matches", orphans included.
#[derive(Default)]
pub struct RecordingConnection {
    tables: HashMap<String, Vec<Row>>,
    log: Mutex<Vec<Statement>>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.tables.insert(table.to_string(), rows);
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.log.lock().clone()
    }

    /// Queries issued against `table`.
    pub fn queries_against(&self, table: &str) -> usize {
        let needle = format!("FROM \"{table}\"");
        self.log
            .lock()
            .iter()
            .filter(|s| s.sql.starts_with("SELECT") && s.sql.contains(&needle))
            .count()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

fn table_of(sql: &str) -> Option<&str> {
    let rest = sql.split(" FROM ").nth(1)?;
    let name = rest.split_whitespace().next()?;
    Some(name.trim_matches(|c| c == '"' || c == '`'))
}

impl Connection for RecordingConnection {
    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.log.lock().push(statement.clone());
        Ok(table_of(&statement.sql)
            .and_then(|t| self.tables.get(t))
            .cloned()
            .unwrap_or_default())
    }

    fn execute(&self, statement: &Statement) -> Result<u64> {
        self.log.lock().push(statement.clone());
        Ok(1)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub posts: Vec<Post>,
}

impl Entity for User {
    const TABLE_NAME: &'static str = "users";

    fn describe(b: &mut EntityBuilder<Self>) {
        b.field("id", |u| &u.id, |u| &mut u.id);
        b.field("userName", |u| &u.user_name, |u| &mut u.user_name);
        b.has_many("posts", |u| &mut u.posts).foreign_key("userId");
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
}

impl Entity for Post {
    const TABLE_NAME: &'static str = "posts";

    fn describe(b: &mut EntityBuilder<Self>) {
        b.field("id", |p| &p.id, |p| &mut p.id);
        b.field("userId", |p| &p.user_id, |p| &mut p.user_id);
        b.field("title", |p| &p.title, |p| &mut p.title);
    }
}

pub fn user(id: i64) -> User {
    User {
        id,
        user_name: format!("user{id}"),
        posts: Vec::new(),
    }
}

pub fn post_row(id: i64, user_id: i64) -> Row {
    Row::from_pairs([
        ("id", Value::BigInt(id)),
        ("user_id", Value::BigInt(user_id)),
        ("title", Value::from(format!("post {id}"))),
    ])
}

pub fn blog(posts: Vec<Row>) -> Database<RecordingConnection> {
    let db = Database::new(
        RecordingConnection::new().with_rows("posts", posts),
        DatabaseConfig::default(),
    );
    db.register::<User>()
        .and_then(|db| db.register::<Post>())
        .expect("blog entities register");
    db
}
