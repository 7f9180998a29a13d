//! The `Entity` trait and per-instance value storage.
//!
//! An entity type declares its table once through [`Entity::declare`]; each
//! instance keeps its column values in a [`Slots`] map keyed by attribute
//! name. All writes go through [`Field::assign`] so field rules such as
//! immutability hold no matter who writes.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::field::Field;
use crate::value::Value;

/// Per-instance storage for column values, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slots {
    values: BTreeMap<String, Value>,
}

impl Slots {
    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.values.get(attr)
    }

    pub fn contains(&self, attr: &str) -> bool {
        self.values.contains_key(attr)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert(&mut self, attr: &str, value: Value) {
        self.values.insert(attr.to_string(), value);
    }
}

/// Table declaration produced by [`Entity::declare`].
///
/// ```ignore
/// TableDecl::new("sample")
///     .field("id", Field::primary_key(SqlType::Integer).autoincrement())
///     .field("login", Field::column(SqlType::string(50)).unique(true))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableDecl {
    database: String,
    name: Option<String>,
    fields: Vec<Field>,
}

impl TableDecl {
    /// Start a declaration for a table in `database`.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: None,
            fields: Vec::new(),
        }
    }

    /// Explicit table name; otherwise derived from the type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Bind a field to an attribute name.
    pub fn field(mut self, attr: impl Into<String>, mut field: Field) -> Self {
        field.attr = attr.into();
        self.fields.push(field);
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a bound field by attribute name.
    pub fn find(&self, attr: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.attr == attr)
    }

    pub(crate) fn into_parts(self) -> (String, Option<String>, Vec<Field>) {
        (self.database, self.name, self.fields)
    }
}

/// A user-declared entity type mapped to one table.
pub trait Entity: Default + Send + Sync + 'static {
    /// The table declaration for this type.
    fn declare() -> TableDecl;

    fn slots(&self) -> &Slots;

    fn slots_mut(&mut self) -> &mut Slots;

    /// Read an attribute: the stored value, else the literal default,
    /// else NULL.
    fn get(&self, attr: &str) -> Value {
        if let Some(value) = self.slots().get(attr) {
            return value.clone();
        }
        Self::declare()
            .find(attr)
            .and_then(Field::default_literal)
            .unwrap_or(Value::Null)
    }

    /// Write an attribute, enforcing immutability and relation rules.
    fn set<V: Into<Value>>(&mut self, attr: &str, value: V) -> Result<()> {
        let decl = Self::declare();
        let owner = decl
            .table_name()
            .map_or_else(|| std::any::type_name::<Self>().to_string(), str::to_string);
        let field = decl.find(attr).ok_or_else(|| Error::UnknownField {
            table: owner.clone(),
            field: attr.to_string(),
        })?;
        field.assign(&owner, self.slots_mut(), value.into())
    }

    /// Builder-style [`Entity::set`].
    fn with<V: Into<Value>>(mut self, attr: &str, value: V) -> Result<Self> {
        self.set(attr, value)?;
        Ok(self)
    }
}
