//! Relation declarations between tables.
//!
//! Relations carry no storage column. They are declared with the free
//! functions in this module and resolved by
//! [`Namespace::finalize`](crate::registry::Namespace::finalize).

use crate::entity::Entity;
use crate::field::{Field, Reference, TableTarget, Target};

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RelationKind::OneToOne => "one-to-one",
            RelationKind::OneToMany => "one-to-many",
            RelationKind::ManyToMany => "many-to-many",
        }
    }
}

/// A pointer to a whole table, resolved to its registered name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableLink {
    Unresolved(TableTarget),
    Resolved { database: String, table: String },
}

impl TableLink {
    pub fn is_resolved(&self) -> bool {
        matches!(self, TableLink::Resolved { .. })
    }

    pub fn describe(&self) -> &str {
        match self {
            TableLink::Unresolved(target) => target.describe(),
            TableLink::Resolved { table, .. } => table,
        }
    }
}

/// A declared relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// Either the owning table holds the foreign key (`"fk_attr"`), or the
    /// other table does (`"other.fk_attr"`).
    OneToOne { foreign_key: Reference },
    /// The foreign key lives on the many side and points back here.
    OneToMany { foreign_key: Reference },
    /// Linked through a secondary table holding a foreign key to each side.
    ManyToMany {
        foreign_table: TableLink,
        secondary: TableLink,
    },
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::OneToOne { .. } => RelationKind::OneToOne,
            Relation::OneToMany { .. } => RelationKind::OneToMany,
            Relation::ManyToMany { .. } => RelationKind::ManyToMany,
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            Relation::OneToOne { foreign_key } | Relation::OneToMany { foreign_key } => {
                foreign_key.is_resolved()
            }
            Relation::ManyToMany {
                foreign_table,
                secondary,
            } => foreign_table.is_resolved() && secondary.is_resolved(),
        }
    }
}

/// One-to-one relation through `foreign_key`: `"fk_attr"` on this table or
/// `"table.fk_attr"` on the other one.
pub fn one_to_one(foreign_key: &str) -> Field {
    Field::relation(Relation::OneToOne {
        foreign_key: Reference::Unresolved(Target::parse(foreign_key)),
    })
}

/// One-to-many relation; `foreign_key` is `"table.fk_attr"` on the many side.
pub fn one_to_many(foreign_key: &str) -> Field {
    Field::relation(Relation::OneToMany {
        foreign_key: Reference::Unresolved(Target::parse(foreign_key)),
    })
}

/// One-to-many relation to entity `E` through its `fk_attr`.
pub fn one_to_many_of<E: Entity>(fk_attr: &str) -> Field {
    Field::relation(Relation::OneToMany {
        foreign_key: Reference::Unresolved(Target {
            table: Some(TableTarget::of::<E>()),
            field: fk_attr.to_string(),
        }),
    })
}

/// Many-to-many relation to `foreign_table` through `secondary`.
pub fn many_to_many(foreign_table: &str, secondary: &str) -> Field {
    Field::relation(Relation::ManyToMany {
        foreign_table: TableLink::Unresolved(TableTarget::Named(foreign_table.to_string())),
        secondary: TableLink::Unresolved(TableTarget::Named(secondary.to_string())),
    })
}

/// Many-to-many relation to entity `F` through entity `S`.
pub fn many_to_many_of<F: Entity, S: Entity>() -> Field {
    Field::relation(Relation::ManyToMany {
        foreign_table: TableLink::Unresolved(TableTarget::of::<F>()),
        secondary: TableLink::Unresolved(TableTarget::of::<S>()),
    })
}
