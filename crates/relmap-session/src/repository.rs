//! Typed reads and writes for one registered entity.

use std::sync::Arc;

use relmap_core::{Connection, Result, Value};
use relmap_query::{Condition, Insert, Select};

use crate::Database;
use crate::entity::Entity;
use crate::row_mapper::RowMapper;

/// Reads and writes `E` through its cached row mapper.
///
/// Obtained from [`Database::repository`], which only hands out repositories
/// for registered entities.
pub struct Repository<'db, E, C: Connection> {
    db: &'db Database<C>,
    mapper: Arc<RowMapper<E>>,
}

impl<'db, E: Entity, C: Connection> Repository<'db, E, C> {
    pub(crate) fn new(db: &'db Database<C>, mapper: Arc<RowMapper<E>>) -> Self {
        Self { db, mapper }
    }

    /// The cached mapper for `E`.
    pub fn mapper(&self) -> &RowMapper<E> {
        &self.mapper
    }

    /// Columns of the top-level simple properties.
    pub fn column_names(&self) -> Vec<String> {
        self.mapper.column_names()
    }

    /// Every column plus declared joins; add filters before calling [`find`](Self::find).
    pub fn select(&self) -> Select {
        self.mapper.select()
    }

    /// Run `select` and map every row.
    #[tracing::instrument(level = "debug", skip(self, select), fields(table = select.table()))]
    pub fn find(&self, select: &Select) -> Result<Vec<E>> {
        let statement = select.render(self.db.chain())?;
        tracing::debug!(target: "relmap::repo", sql = %statement.sql, params = statement.params.len(), "Querying");
        let rows = self.db.connection().query(&statement)?;
        tracing::debug!(target: "relmap::repo", rows = rows.len(), "Mapping rows");
        rows.iter()
            .map(|row| self.mapper.map_row(row).map_err(Into::into))
            .collect()
    }

    /// Every row of the table, joins included.
    pub fn find_all(&self) -> Result<Vec<E>> {
        self.find(&self.select())
    }

    /// The entity whose identifier equals `id`, bound through the
    /// identifier's converter.
    pub fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<E>> {
        let id_property = self.mapper.metadata().id()?;
        let select = self
            .select()
            .filter(
                Condition::eq(id_property.column(), id).with_type(id_property.type_info()),
            )
            .limit(1);
        Ok(self.find(&select)?.into_iter().next())
    }

    /// Insert `entity`, every simple property bound through its converter.
    /// Returns the affected row count.
    #[tracing::instrument(level = "debug", skip(self, entity), fields(table = E::TABLE_NAME))]
    pub fn insert(&self, entity: &E) -> Result<u64> {
        let insert = self
            .mapper
            .bind(entity)?
            .into_iter()
            .fold(Insert::into(E::TABLE_NAME), |insert, b| {
                insert.bound(b.column, b.property, b.placeholder, b.value)
            });
        let statement = insert.render(self.db.chain())?;
        tracing::debug!(target: "relmap::repo", sql = %statement.sql, "Inserting");
        self.db.connection().execute(&statement)
    }

    /// Batch load an association onto `parents`.
    #[track_caller]
    pub fn load(&self, parents: &mut [E], association: &str) -> Result<()> {
        self.db.load_association(parents, association)
    }
}

impl<E, C: Connection> std::fmt::Debug for Repository<'_, E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("mapper", &self.mapper)
            .finish_non_exhaustive()
    }
}
