//! Association metadata.
//!
//! Associations are declared per entity type when the entity describes
//! itself, and resolved when an association is loaded. Row mapping never
//! touches plural associations; they are filled exclusively by the batch
//! loader with one grouped query per association.

use crate::types::TypeInfo;

/// The cardinality of a relationship between two entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelationshipKind {
    /// Many-to-one: many `User`s belong to one `Group` (mapped as a nested join).
    ManyToOne,
    /// One-to-many: one `User` has many `Post`s (batch loaded).
    #[default]
    OneToMany,
}

/// How a one-to-many association is fetched and distributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDescriptor {
    /// Property on the parent holding the collection (e.g. `"posts"`).
    pub property: &'static str,

    /// Property on the child holding the parent's id (e.g. `"userId"`).
    pub foreign_key: Option<&'static str>,

    /// Child properties to fetch; empty means every simple property.
    pub columns: Vec<&'static str>,

    /// Child entity type.
    pub child: TypeInfo,

    /// Child table name.
    pub child_table: &'static str,

    /// Kind of relationship.
    pub kind: RelationshipKind,
}

impl AssociationDescriptor {
    /// Create a one-to-many descriptor with no foreign key set yet.
    pub fn new(property: &'static str, child: TypeInfo, child_table: &'static str) -> Self {
        Self {
            property,
            foreign_key: None,
            columns: Vec::new(),
            child,
            child_table,
            kind: RelationshipKind::OneToMany,
        }
    }

    /// Set the child's foreign-key property.
    #[must_use]
    pub fn foreign_key(mut self, property: &'static str) -> Self {
        self.foreign_key = Some(property);
        self
    }

    /// Restrict the child properties fetched.
    #[must_use]
    pub fn columns(mut self, properties: &[&'static str]) -> Self {
        self.columns = properties.to_vec();
        self
    }

    /// Properties to fetch, with the foreign key appended if it was not requested.
    ///
    /// Grouping children by parent needs the foreign key even when the caller
    /// never asked for it. Returns `None` when every property should be fetched.
    pub fn fetch_properties(&self) -> Option<Vec<&'static str>> {
        if self.columns.is_empty() {
            return None;
        }
        let mut props = self.columns.clone();
        if let Some(fk) = self.foreign_key {
            if !props.contains(&fk) {
                props.push(fk);
            }
        }
        Some(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post;

    fn descriptor() -> AssociationDescriptor {
        AssociationDescriptor::new("posts", TypeInfo::structure::<Post>(), "posts")
    }

    #[test]
    fn test_relationship_kind_default() {
        assert_eq!(RelationshipKind::default(), RelationshipKind::OneToMany);
    }

    #[test]
    fn test_descriptor_builder_chain() {
        let d = descriptor().foreign_key("userId").columns(&["id", "title"]);
        assert_eq!(d.property, "posts");
        assert_eq!(d.foreign_key, Some("userId"));
        assert_eq!(d.columns, vec!["id", "title"]);
        assert_eq!(d.child_table, "posts");
        assert_eq!(d.kind, RelationshipKind::OneToMany);
    }

    #[test]
    fn test_fetch_properties_appends_foreign_key() {
        let d = descriptor().foreign_key("userId").columns(&["id", "title"]);
        assert_eq!(d.fetch_properties(), Some(vec!["id", "title", "userId"]));
    }

    #[test]
    fn test_fetch_properties_keeps_requested_foreign_key_once() {
        let d = descriptor().foreign_key("userId").columns(&["userId", "id"]);
        assert_eq!(d.fetch_properties(), Some(vec!["userId", "id"]));
    }

    #[test]
    fn test_fetch_properties_all_when_unrestricted() {
        let d = descriptor().foreign_key("userId");
        assert_eq!(d.fetch_properties(), None);
    }
}
