//! Entity declarations.
//!
//! An entity describes its properties once through an [`EntityBuilder`]:
//! each property is a typed get/set pair, so mapping never needs runtime
//! reflection. The description is turned into cached metadata the first
//! time the entity is used.

use relmap_core::{AssociationDescriptor, MappingError, SqlTyped, TypeInfo, Value};
use relmap_query::JoinKind;

use crate::association::{AssociationLoader, HasMany};
use crate::metadata::NestedDecl;
use crate::row_mapper::NestedField;

/// A plain value-holder mapped to a table.
///
/// ```
/// use relmap_session::{Entity, EntityBuilder};
///
/// #[derive(Debug, Default, Clone)]
/// struct Post {
///     id: i64,
///     user_id: i64,
///     title: String,
/// }
///
/// impl Entity for Post {
///     const TABLE_NAME: &'static str = "posts";
///
///     fn describe(b: &mut EntityBuilder<Self>) {
///         b.field("id", |p| &p.id, |p| &mut p.id);
///         b.field("userId", |p| &p.user_id, |p| &mut p.user_id);
///         b.field("title", |p| &p.title, |p| &mut p.title);
///     }
/// }
/// ```
pub trait Entity: Default + Send + Sync + 'static {
    /// Table the entity is read from and written to.
    const TABLE_NAME: &'static str;

    /// Property holding the identifier.
    const ID_PROPERTY: &'static str = "id";

    /// Declare properties, nested objects and associations.
    fn describe(builder: &mut EntityBuilder<Self>);
}

type Getter<E> = Box<dyn Fn(&E) -> Result<Value, MappingError> + Send + Sync>;
type Setter<E> = Box<dyn Fn(&mut E, Value) -> Result<(), MappingError> + Send + Sync>;

/// Typed access to one property through its canonical value.
pub(crate) struct ValueAccess<E> {
    pub(crate) get: Getter<E>,
    pub(crate) set: Setter<E>,
}

#[derive(Debug, Clone)]
pub(crate) struct JoinDecl {
    pub(crate) kind: JoinKind,
    pub(crate) local_column: String,
    pub(crate) remote_column: String,
}

pub(crate) enum DeclKind<E> {
    Simple { ty: TypeInfo, access: ValueAccess<E> },
    Nested(Box<dyn NestedDecl<E>>),
}

/// One declared property; returned by the builder for further tuning.
pub struct PropertyDecl<E> {
    pub(crate) name: &'static str,
    pub(crate) column: Option<String>,
    pub(crate) join: Option<JoinDecl>,
    pub(crate) kind: DeclKind<E>,
}

impl<E> PropertyDecl<E> {
    /// Override the column name the naming convention would derive.
    pub fn column(&mut self, column: impl Into<String>) -> &mut Self {
        self.column = Some(column.into());
        self
    }

    /// Join the nested object's table whenever the entity is selected:
    /// `<parent>.<local_column> = <property>.<remote_column>`.
    ///
    /// Only meaningful on nested properties.
    pub fn join(
        &mut self,
        kind: JoinKind,
        local_column: impl Into<String>,
        remote_column: impl Into<String>,
    ) -> &mut Self {
        self.join = Some(JoinDecl {
            kind,
            local_column: local_column.into(),
            remote_column: remote_column.into(),
        });
        self
    }
}

/// A declared one-to-many association.
pub struct AssociationDecl<P> {
    pub(crate) descriptor: AssociationDescriptor,
    pub(crate) loader: Box<dyn AssociationLoader<P>>,
}

impl<P> AssociationDecl<P> {
    /// Child property holding the parent's id.
    pub fn foreign_key(&mut self, property: &'static str) -> &mut Self {
        self.descriptor.foreign_key = Some(property);
        self
    }

    /// Restrict the child properties fetched; the foreign key is always added.
    pub fn columns(&mut self, properties: &[&'static str]) -> &mut Self {
        self.descriptor.columns = properties.to_vec();
        self
    }

    /// The association as declared.
    pub fn descriptor(&self) -> &AssociationDescriptor {
        &self.descriptor
    }
}

/// Collects an entity's declarations.
pub struct EntityBuilder<E> {
    pub(crate) properties: Vec<PropertyDecl<E>>,
    pub(crate) associations: Vec<AssociationDecl<E>>,
}

impl<E: Entity> EntityBuilder<E> {
    pub(crate) fn new() -> Self {
        Self {
            properties: Vec::new(),
            associations: Vec::new(),
        }
    }

    fn push(&mut self, name: &'static str, kind: DeclKind<E>) -> &mut PropertyDecl<E> {
        self.properties.push(PropertyDecl {
            name,
            column: None,
            join: None,
            kind,
        });
        let last = self.properties.len() - 1;
        &mut self.properties[last]
    }

    /// A column-backed property.
    pub fn field<T: SqlTyped>(
        &mut self,
        name: &'static str,
        get: fn(&E) -> &T,
        get_mut: fn(&mut E) -> &mut T,
    ) -> &mut PropertyDecl<E> {
        let access = ValueAccess {
            get: Box::new(move |e: &E| get(e).to_value()),
            set: Box::new(move |e: &mut E, v: Value| {
                *get_mut(e) = T::from_value(v)?;
                Ok(())
            }),
        };
        self.push(
            name,
            DeclKind::Simple {
                ty: T::type_info(),
                access,
            },
        )
    }

    /// A nullable column-backed property.
    pub fn optional<T: SqlTyped>(
        &mut self,
        name: &'static str,
        get: fn(&E) -> &Option<T>,
        get_mut: fn(&mut E) -> &mut Option<T>,
    ) -> &mut PropertyDecl<E> {
        let access = ValueAccess {
            get: Box::new(move |e: &E| get(e).as_ref().map_or(Ok(Value::Null), T::to_value)),
            set: Box::new(move |e: &mut E, v: Value| {
                *get_mut(e) = if v.is_null() {
                    None
                } else {
                    Some(T::from_value(v)?)
                };
                Ok(())
            }),
        };
        self.push(
            name,
            DeclKind::Simple {
                ty: T::type_info(),
                access,
            },
        )
    }

    /// A nested object read from columns prefixed `<name>.`.
    pub fn nested<N: Entity>(
        &mut self,
        name: &'static str,
        get_mut: fn(&mut E) -> &mut Option<N>,
    ) -> &mut PropertyDecl<E> {
        self.push(name, DeclKind::Nested(Box::new(NestedField::new(get_mut))))
    }

    /// A one-to-many association filled by the batch loader.
    pub fn has_many<C: Entity + Clone>(
        &mut self,
        name: &'static str,
        collection: fn(&mut E) -> &mut Vec<C>,
    ) -> &mut AssociationDecl<E> {
        self.associations.push(AssociationDecl {
            descriptor: AssociationDescriptor::new(
                name,
                TypeInfo::structure::<C>(),
                C::TABLE_NAME,
            ),
            loader: Box::new(HasMany::new(collection)),
        });
        let last = self.associations.len() - 1;
        &mut self.associations[last]
    }
}
