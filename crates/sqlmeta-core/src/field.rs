//! Field declarations: columns, primary keys and foreign keys.
//!
//! A [`Field`] is declared anonymously with one of the constructors below
//! and bound to an attribute name when it is added to a
//! [`TableDecl`](crate::entity::TableDecl). Relations are declared in
//! [`crate::relationship`] and share the same `Field` representation.

use std::any::TypeId;

use crate::entity::{Entity, Slots};
use crate::error::{Error, Result};
use crate::relationship::Relation;
use crate::types::SqlType;
use crate::value::Value;

/// A SQL function evaluated by the database instead of bound as a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlFunction {
    /// Current UTC time.
    UtcNow,
}

/// Default for a column: a literal or a deferred SQL function.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Value(Value),
    Function(SqlFunction),
}

/// The value a field contributes to a write statement.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Bound as a positional parameter.
    Literal(Value),
    /// Rendered inline as a SQL expression.
    Function(SqlFunction),
}

/// Which table a reference points into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableTarget {
    /// By table name, within the owner's database.
    Named(String),
    /// By entity type.
    Typed {
        type_id: TypeId,
        type_name: &'static str,
    },
}

impl TableTarget {
    /// Target the table registered for entity `E`.
    pub fn of<E: Entity>() -> Self {
        TableTarget::Typed {
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
        }
    }

    /// Name used in diagnostics.
    pub fn describe(&self) -> &str {
        match self {
            TableTarget::Named(name) => name,
            TableTarget::Typed { type_name, .. } => type_name,
        }
    }
}

/// An unresolved pointer to a field: `"table.field"`, or a bare field of
/// the owning table when `table` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub table: Option<TableTarget>,
    pub field: String,
}

impl Target {
    /// Parse `"table.field"` or `"field"`.
    pub fn parse(text: &str) -> Self {
        match text.split_once('.') {
            Some((table, field)) => Target {
                table: Some(TableTarget::Named(table.to_string())),
                field: field.to_string(),
            },
            None => Target {
                table: None,
                field: text.to_string(),
            },
        }
    }

    pub fn describe(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table.describe(), self.field),
            None => self.field.clone(),
        }
    }
}

/// A reference after resolution: the target table and the target field's
/// attribute and storage column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub database: String,
    pub table: String,
    pub field: String,
    pub column: String,
}

/// Two-phase reference: declared by name, resolved once the target table
/// is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Unresolved(Target),
    Resolved(ResolvedRef),
}

impl Reference {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }

    pub fn resolved(&self) -> Option<&ResolvedRef> {
        match self {
            Reference::Resolved(r) => Some(r),
            Reference::Unresolved(_) => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Reference::Unresolved(target) => target.describe(),
            Reference::Resolved(r) => format!("{}.{}", r.table, r.field),
        }
    }
}

/// What kind of field this is.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Column,
    PrimaryKey,
    ForeignKey(Reference),
    Relation(Relation),
}

/// A typed, named accessor for a column or relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Attribute name on the entity; set when the field binds to a table.
    pub attr: String,
    /// Explicit storage column name, if different from `attr`.
    pub column: Option<String>,
    /// Column type; `None` for relations and unresolved foreign keys.
    pub sql_type: Option<SqlType>,
    pub nullable: bool,
    pub unique: bool,
    pub immutable: bool,
    pub primary_key: bool,
    pub autoincrement: bool,
    pub default: Option<DefaultValue>,
    pub kind: FieldKind,
}

impl Field {
    fn base(kind: FieldKind, sql_type: Option<SqlType>) -> Self {
        Self {
            attr: String::new(),
            column: None,
            sql_type,
            nullable: false,
            unique: false,
            immutable: false,
            primary_key: false,
            autoincrement: false,
            default: None,
            kind,
        }
    }

    /// Declare a plain column.
    pub fn column(sql_type: SqlType) -> Self {
        Self::base(FieldKind::Column, Some(sql_type))
    }

    /// Declare a primary key column. Primary keys are always immutable.
    pub fn primary_key(sql_type: SqlType) -> Self {
        let mut field = Self::base(FieldKind::PrimaryKey, Some(sql_type));
        field.primary_key = true;
        field.immutable = true;
        field
    }

    /// Declare a foreign key to `"table.field"`.
    ///
    /// The storage type is copied from the referenced field during
    /// resolution.
    pub fn foreign_key(target: &str) -> Self {
        Self::base(
            FieldKind::ForeignKey(Reference::Unresolved(Target::parse(target))),
            None,
        )
    }

    /// Declare a foreign key to a field of entity `E`.
    pub fn foreign_key_to<E: Entity>(field: &str) -> Self {
        Self::base(
            FieldKind::ForeignKey(Reference::Unresolved(Target {
                table: Some(TableTarget::of::<E>()),
                field: field.to_string(),
            })),
            None,
        )
    }

    pub(crate) fn relation(relation: Relation) -> Self {
        Self::base(FieldKind::Relation(relation), None)
    }

    /// Use an explicit storage column name.
    pub fn named(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    pub fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }

    /// Mark immutable; first write wins. Has no effect on primary keys.
    pub fn immutable(mut self, value: bool) -> Self {
        self.immutable = value || self.primary_key;
        self
    }

    /// Let the database generate this key.
    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    /// Make a foreign key part of the table's primary key.
    pub fn as_primary_key(mut self) -> Self {
        self.primary_key = true;
        self.immutable = true;
        self
    }

    /// Literal default used when the instance has no value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Deferred SQL function default, e.g. [`SqlFunction::UtcNow`].
    pub fn default_function(mut self, function: SqlFunction) -> Self {
        self.default = Some(DefaultValue::Function(function));
        self
    }

    /// Storage column name: explicit name or the attribute name.
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.attr)
    }

    /// Whether this field has a storage column.
    pub fn is_stored(&self) -> bool {
        !matches!(self.kind, FieldKind::Relation(_))
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self.kind, FieldKind::ForeignKey(_))
    }

    pub fn reference(&self) -> Option<&Reference> {
        match &self.kind {
            FieldKind::ForeignKey(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&Relation> {
        match &self.kind {
            FieldKind::Relation(relation) => Some(relation),
            _ => None,
        }
    }

    /// Literal default, if any.
    pub fn default_literal(&self) -> Option<Value> {
        match &self.default {
            Some(DefaultValue::Value(v)) => Some(v.clone()),
            _ => None,
        }
    }

    /// Value this field contributes for an instance: the stored value,
    /// else the default, else NULL.
    pub fn value_for(&self, slots: &Slots) -> FieldValue {
        if let Some(value) = slots.get(&self.attr) {
            return FieldValue::Literal(value.clone());
        }
        match &self.default {
            Some(DefaultValue::Value(v)) => FieldValue::Literal(v.clone()),
            Some(DefaultValue::Function(f)) => FieldValue::Function(*f),
            None => FieldValue::Literal(Value::Null),
        }
    }

    /// Write a value into an instance's slots, enforcing field rules.
    pub fn assign(&self, table: &str, slots: &mut Slots, value: Value) -> Result<()> {
        if let FieldKind::Relation(relation) = &self.kind {
            return Err(Error::UnsupportedOperation(format!(
                "cannot assign {} relation {table}.{}",
                relation.kind().as_str(),
                self.attr
            )));
        }
        if self.immutable {
            if let Some(current) = slots.get(&self.attr) {
                if current != &value {
                    return Err(Error::ImmutableField {
                        table: table.to_string(),
                        field: self.attr.clone(),
                    });
                }
            }
        }
        slots.insert(&self.attr, value);
        Ok(())
    }

    /// Resolve a foreign key against its target; no-op once resolved.
    ///
    /// Copies the target's storage type and never carries autoincrement
    /// over: a referencing column is never generated.
    pub fn resolve_foreign_key(&mut self, target: ResolvedRef, sql_type: SqlType) -> bool {
        match &mut self.kind {
            FieldKind::ForeignKey(reference @ Reference::Unresolved(_)) => {
                *reference = Reference::Resolved(target);
                self.sql_type = Some(sql_type);
                self.autoincrement = false;
                true
            }
            _ => false,
        }
    }
}
