//! Result rows and column-prefixed views over them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::Value;

/// Named column lookup over one result row.
///
/// Row mappers only ever ask for columns by name, which lets a nested mapper
/// operate on a [`PrefixedRow`] without knowing it is looking at a sub-slice.
pub trait RowAccess {
    /// The value of `column`, or `None` if the row has no such column.
    fn value(&self, column: &str) -> Option<&Value>;
}

/// Column names shared by every row of one result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Columns {
    /// Build the column index for a result set.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, index }
    }

    /// Position of a column, if present.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Column names in result order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One row of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<Columns>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row; `values` must line up with `columns`.
    pub fn new(columns: Arc<Columns>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Build a standalone row from `(column, value)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        Self::new(Arc::new(Columns::new(names)), values)
    }

    /// Value at a position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of a named column.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.columns
            .position(name)
            .and_then(|i| self.values.get(i))
    }

    /// The shared column index.
    pub fn columns(&self) -> &Arc<Columns> {
        &self.columns
    }

    /// Column names in result order.
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    /// Values in result order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl RowAccess for Row {
    fn value(&self, column: &str) -> Option<&Value> {
        self.get_named(column)
    }
}

/// A view that prepends `<prefix>.` to every column lookup.
///
/// Views compose: a view over a view resolves `owner.id` against
/// `group.owner.id` on the real row.
pub struct PrefixedRow<'a> {
    inner: &'a dyn RowAccess,
    prefix: String,
}

impl<'a> PrefixedRow<'a> {
    /// Wrap `inner` so lookups of `col` resolve `prefix.col`.
    pub fn new(inner: &'a dyn RowAccess, prefix: &str) -> Self {
        let mut prefix = prefix.to_string();
        prefix.push('.');
        Self { inner, prefix }
    }
}

impl RowAccess for PrefixedRow<'_> {
    fn value(&self, column: &str) -> Option<&Value> {
        let mut key = String::with_capacity(self.prefix.len() + column.len());
        key.push_str(&self.prefix);
        key.push_str(column);
        self.inner.value(&key)
    }
}
