//! The boundary to the blocking database client.
//!
//! relmap issues no I/O of its own. Drivers implement [`Connection`] over
//! whatever synchronous client they wrap and map its faults into
//! [`DatabaseError`](crate::error::DatabaseError).

use crate::error::Result;
use crate::row::Row;
use crate::value::Value;

/// A named bound parameter (`:name` in statement text).
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: Value,
}

impl Param {
    /// Create a parameter.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A rendered statement ready for execution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Statement {
    /// Create a statement.
    pub fn new(sql: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Look up a bound parameter by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }
}

/// A synchronous database connection.
///
/// Calls block the calling thread until the client returns.
pub trait Connection: Send + Sync {
    /// Run a query and collect its rows.
    fn query(&self, statement: &Statement) -> Result<Vec<Row>>;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, statement: &Statement) -> Result<u64>;
}

impl<C: Connection + ?Sized> Connection for &C {
    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        (**self).query(statement)
    }

    fn execute(&self, statement: &Statement) -> Result<u64> {
        (**self).execute(statement)
    }
}

impl<C: Connection + ?Sized> Connection for std::sync::Arc<C> {
    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        (**self).query(statement)
    }

    fn execute(&self, statement: &Statement) -> Result<u64> {
        (**self).execute(statement)
    }
}
