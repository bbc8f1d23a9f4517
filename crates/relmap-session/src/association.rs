//! Batch loading of one-to-many associations.
//!
//! Loading an association for any number of parents issues exactly one
//! query against the child table: `WHERE <fk> IN (<distinct parent ids>)`.
//! Every parent's collection is reset to empty before children are
//! distributed, so parents without children end up with an empty `Vec`.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use relmap_core::{AssociationDescriptor, ConfigError, Connection, Result, Value};
use relmap_dialect::DialectChain;
use relmap_query::Condition;
use uuid::Uuid;

use crate::entity::{AssociationDecl, Entity};
use crate::metadata::MetadataCache;

/// What a loader needs from the owning database.
pub(crate) struct LoadContext<'a> {
    pub(crate) connection: &'a dyn Connection,
    pub(crate) chain: &'a DialectChain,
    pub(crate) cache: &'a MetadataCache,
    pub(crate) registered: &'a RwLock<HashSet<TypeId>>,
}

/// Loads one association for a slice of parents.
pub(crate) trait AssociationLoader<P>: Send + Sync {
    fn load(
        &self,
        ctx: &LoadContext<'_>,
        descriptor: &AssociationDescriptor,
        parents: &mut [P],
    ) -> Result<()>;
}

/// A resolved association of entity `P`.
pub struct Association<P> {
    pub(crate) descriptor: AssociationDescriptor,
    pub(crate) loader: Box<dyn AssociationLoader<P>>,
}

impl<P> Association<P> {
    /// Property, foreign key and child type of this association.
    pub fn descriptor(&self) -> &AssociationDescriptor {
        &self.descriptor
    }
}

impl<P> From<AssociationDecl<P>> for Association<P> {
    fn from(decl: AssociationDecl<P>) -> Self {
        Self {
            descriptor: decl.descriptor,
            loader: decl.loader,
        }
    }
}

/// Grouping key for identifier values.
///
/// Integers of every width collapse to one key, and typed wrappers are
/// looked through, so an `Int` parent id matches a `BigInt` foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Other(String),
}

impl From<&Value> for ValueKey {
    fn from(value: &Value) -> Self {
        let value = value.untyped();
        if let Some(n) = value.as_i64() {
            return ValueKey::Int(n);
        }
        match value {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Float(f) => ValueKey::Float(f64::from(*f).to_bits()),
            Value::Double(f) => ValueKey::Float(f.to_bits()),
            Value::Text(s) | Value::Decimal(s) => ValueKey::Text(s.clone()),
            Value::Bytes(b) => ValueKey::Bytes(b.clone()),
            Value::Uuid(u) => ValueKey::Uuid(*u),
            other => ValueKey::Other(other.to_string()),
        }
    }
}

pub(crate) struct HasMany<P, C> {
    collection: fn(&mut P) -> &mut Vec<C>,
}

impl<P, C> HasMany<P, C> {
    pub(crate) fn new(collection: fn(&mut P) -> &mut Vec<C>) -> Self {
        Self { collection }
    }
}

fn misconfigured<P>(descriptor: &AssociationDescriptor, reason: String) -> ConfigError {
    ConfigError::AssociationMisconfigured {
        entity: std::any::type_name::<P>().to_string(),
        association: descriptor.property.to_string(),
        reason,
    }
}

impl<P: Entity, C: Entity + Clone> AssociationLoader<P> for HasMany<P, C> {
    fn load(
        &self,
        ctx: &LoadContext<'_>,
        descriptor: &AssociationDescriptor,
        parents: &mut [P],
    ) -> Result<()> {
        if !ctx.registered.read().contains(&TypeId::of::<C>()) {
            return Err(ConfigError::RepositoryNotFound {
                type_name: std::any::type_name::<C>().to_string(),
            }
            .into());
        }

        let parent_mapper = ctx.cache.mapper::<P>()?;
        let child_mapper = ctx.cache.mapper::<C>()?;
        let child_meta = child_mapper.metadata();

        // Configuration is checked before any query goes out.
        let fk_name = descriptor
            .foreign_key
            .ok_or_else(|| misconfigured::<P>(descriptor, "no foreign key declared".into()))?;
        let fk = child_meta.simple_property(fk_name).ok_or_else(|| {
            misconfigured::<P>(
                descriptor,
                format!("`{}` has no column for `{fk_name}`", child_meta.type_name()),
            )
        })?;
        let id = parent_mapper.metadata().id()?;
        let select = match descriptor.fetch_properties() {
            Some(properties) => child_mapper.select_properties(&properties)?,
            None => child_mapper.select(),
        };

        let mut owners: HashMap<ValueKey, Vec<usize>> = HashMap::new();
        let mut ids = Vec::new();
        for (i, parent) in parents.iter().enumerate() {
            let value = id.get(parent)?;
            if value.is_null() {
                continue;
            }
            let slot = owners.entry(ValueKey::from(&value)).or_default();
            if slot.is_empty() {
                ids.push(value);
            }
            slot.push(i);
        }

        let statement = select
            .filter(Condition::is_in(fk.column(), ids).with_type(fk.type_info()))
            .render(ctx.chain)?;
        tracing::debug!(
            target: "relmap::assoc",
            association = descriptor.property,
            parents = parents.len(),
            keys = owners.len(),
            sql = %statement.sql,
            "Batch loading association"
        );
        let rows = ctx.connection.query(&statement)?;

        for parent in parents.iter_mut() {
            *(self.collection)(parent) = Vec::new();
        }

        let mut orphans = 0_usize;
        for row in &rows {
            let child = child_mapper.map_row(row)?;
            let key = ValueKey::from(&fk.get(&child)?);
            let Some((&last, rest)) = owners.get(&key).and_then(|o| o.split_last()) else {
                orphans += 1;
                continue;
            };
            for &i in rest {
                (self.collection)(&mut parents[i]).push(child.clone());
            }
            (self.collection)(&mut parents[last]).push(child);
        }

        if orphans > 0 {
            tracing::debug!(
                target: "relmap::assoc",
                association = descriptor.property,
                orphans,
                "Dropped children matching no loaded parent"
            );
        }
        Ok(())
    }
}
