//! Row mapping and parameter binding.

use std::sync::Arc;

use relmap_core::{ConfigError, MappingError, PrefixedRow, RowAccess, TypeInfo, Value};
use relmap_query::{Join, Select};

use crate::entity::{Entity, JoinDecl};
use crate::metadata::{EntityMetadata, MetadataCache, NestedDecl};

/// A nested property, resolved to the row mapper of its type.
pub(crate) trait NestedSlot<E>: Send + Sync {
    fn property(&self) -> &'static str;

    /// Map the nested object from a prefixed view and store it on `target`,
    /// allocating the parent only when there is something to store.
    fn apply(&self, view: &dyn RowAccess, target: &mut Option<E>) -> Result<(), MappingError>;

    /// Joins declared for this property and below, aliased from `parent_path`.
    fn collect_joins(&self, parent_path: Option<&str>, out: &mut Vec<Join>);
}

pub(crate) struct NestedField<E, N> {
    get_mut: fn(&mut E) -> &mut Option<N>,
}

impl<E, N> NestedField<E, N> {
    pub(crate) fn new(get_mut: fn(&mut E) -> &mut Option<N>) -> Self {
        Self { get_mut }
    }
}

impl<E: Entity, N: Entity> NestedDecl<E> for NestedField<E, N> {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::structure::<N>()
    }

    fn resolve(
        &self,
        name: &'static str,
        join: Option<JoinDecl>,
        cache: &MetadataCache,
    ) -> Result<Box<dyn NestedSlot<E>>, ConfigError> {
        Ok(Box::new(NestedMapping {
            name,
            join,
            get_mut: self.get_mut,
            mapper: cache.mapper::<N>()?,
        }))
    }
}

struct NestedMapping<E, N> {
    name: &'static str,
    join: Option<JoinDecl>,
    get_mut: fn(&mut E) -> &mut Option<N>,
    mapper: Arc<RowMapper<N>>,
}

impl<E: Entity, N: Entity> NestedSlot<E> for NestedMapping<E, N> {
    fn property(&self) -> &'static str {
        self.name
    }

    fn apply(&self, view: &dyn RowAccess, target: &mut Option<E>) -> Result<(), MappingError> {
        if let Some(child) = self.mapper.map_nested(view)? {
            *(self.get_mut)(target.get_or_insert_with(E::default)) = Some(child);
        }
        Ok(())
    }

    fn collect_joins(&self, parent_path: Option<&str>, out: &mut Vec<Join>) {
        let Some(join) = &self.join else {
            return;
        };
        let path = match parent_path {
            Some(parent) => format!("{parent}.{}", self.name),
            None => self.name.to_string(),
        };
        out.push(
            Join::new(join.kind, N::TABLE_NAME, path.clone())
                .on(join.local_column.clone(), join.remote_column.clone())
                .columns(self.mapper.column_names()),
        );
        self.mapper.collect_joins(Some(&path), out);
    }
}

/// A simple property's value written for binding.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundValue {
    pub property: &'static str,
    pub column: String,
    /// The value as the engine accepts it.
    pub value: Value,
    /// Placeholder text, e.g. `(:status)::user_status`.
    pub placeholder: String,
}

/// Maps rows into `E` and entities into bound values.
///
/// Simple properties read their column from the row; a missing column is
/// skipped. Nested properties read through a view that prefixes every
/// column with `<property>.`, so joins of any depth compose.
pub struct RowMapper<E> {
    metadata: EntityMetadata<E>,
}

impl<E: Entity> RowMapper<E> {
    pub(crate) fn new(metadata: EntityMetadata<E>) -> Self {
        Self { metadata }
    }

    /// Metadata this mapper was built from.
    pub fn metadata(&self) -> &EntityMetadata<E> {
        &self.metadata
    }

    /// Column names of the simple properties, in declaration order.
    pub fn column_names(&self) -> Vec<String> {
        self.metadata
            .simple
            .iter()
            .map(|p| p.column.clone())
            .collect()
    }

    /// Map a top-level row. Always yields an instance, even when every
    /// column is NULL.
    pub fn map_row(&self, row: &dyn RowAccess) -> Result<E, MappingError> {
        Ok(self.map_view(row)?.unwrap_or_default())
    }

    /// Map a nested view. Yields `None` when no column carries a value, so
    /// an unmatched outer join stays `None` rather than a default instance.
    pub fn map_nested(&self, view: &dyn RowAccess) -> Result<Option<E>, MappingError> {
        self.map_view(view)
    }

    fn map_view(&self, row: &dyn RowAccess) -> Result<Option<E>, MappingError> {
        let meta = &self.metadata;
        let mut target: Option<E> = None;

        for p in &meta.simple {
            let wrap = |e: MappingError| e.at_property(meta.type_name, p.name, p.column.as_str());
            let Some(value) = p.converter.read(row, &p.column).map_err(wrap)? else {
                continue;
            };
            // NULL allocates nothing, so an unmatched outer join maps to None.
            if value.is_null() {
                continue;
            }
            let entity = target.get_or_insert_with(E::default);
            (p.access.set)(entity, value).map_err(wrap)?;
        }

        for n in &meta.nested {
            let view = PrefixedRow::new(row, n.property());
            n.apply(&view, &mut target)?;
        }

        Ok(target)
    }

    /// Write every simple property of `entity` through its converter.
    pub fn bind(&self, entity: &E) -> Result<Vec<BoundValue>, MappingError> {
        let meta = &self.metadata;
        meta.simple
            .iter()
            .map(|p| {
                let wrap = |e: MappingError| e.at_property(meta.type_name, p.name, p.column.as_str());
                let value = p.get(entity).map_err(wrap)?;
                let value = p.converter.write(value).map_err(wrap)?;
                Ok(BoundValue {
                    property: p.name,
                    column: p.column.clone(),
                    value,
                    placeholder: p.converter.format_parameter(p.name),
                })
            })
            .collect()
    }

    /// SELECT of every simple column plus the declared joins.
    pub fn select(&self) -> Select {
        let mut joins = Vec::new();
        self.collect_joins(None, &mut joins);
        joins
            .into_iter()
            .fold(Select::from(self.metadata.table).columns(self.column_names()), Select::join)
    }

    /// SELECT of the named properties only, without joins.
    pub fn select_properties(&self, properties: &[&str]) -> Result<Select, ConfigError> {
        let columns = properties
            .iter()
            .map(|name| {
                self.metadata
                    .simple_property(name)
                    .map(|p| p.column.clone())
                    .ok_or_else(|| ConfigError::UnknownProperty {
                        entity: self.metadata.type_name.to_string(),
                        property: (*name).to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Select::from(self.metadata.table).columns(columns))
    }

    pub(crate) fn collect_joins(&self, parent_path: Option<&str>, out: &mut Vec<Join>) {
        for n in &self.metadata.nested {
            n.collect_joins(parent_path, out);
        }
    }
}

impl<E> std::fmt::Debug for RowMapper<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowMapper")
            .field("entity", &self.metadata.type_name)
            .field("table", &self.metadata.table)
            .field("simple", &self.metadata.simple.len())
            .field("nested", &self.metadata.nested.len())
            .finish()
    }
}
