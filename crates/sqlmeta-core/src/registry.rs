//! Schema registry: the per-database table namespace.
//!
//! Registration is two-phase. [`Namespace::register`] records a table with
//! its references left unresolved, since foreign keys and relations may
//! point at tables that are not registered yet. [`Namespace::finalize`]
//! then resolves everything it can and leaves the rest for a later pass.
//! Queries call [`TableDef::ensure_resolved`] and fail loudly if a
//! reference they need is still pending.
//!
//! The namespace is an explicit context object. It performs no locking;
//! callers serialize registration and finalization, after which it is
//! read-only and can be shared freely.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::entity::{Entity, Slots};
use crate::error::{Error, Result};
use crate::field::{Field, FieldKind, Reference, ResolvedRef, TableTarget};
use crate::identifiers::table_name_for;
use crate::relationship::{Relation, TableLink};
use crate::row::Row;
use crate::types::SqlType;
use crate::value::Value;

/// Extracts primary-key values from an instance, in key-column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyExtractor {
    /// `(column, attribute)` pairs sorted by column name.
    columns: Vec<(String, String)>,
}

impl KeyExtractor {
    fn build(primary_key: &BTreeMap<String, String>) -> Self {
        Self {
            columns: primary_key
                .iter()
                .map(|(col, attr)| (col.clone(), attr.clone()))
                .collect(),
        }
    }

    /// `(column, value)` pairs; every key column must have a value.
    pub fn extract(&self, table: &str, slots: &Slots) -> Result<Vec<(String, Value)>> {
        self.columns
            .iter()
            .map(|(column, attr)| match slots.get(attr) {
                Some(value) if !value.is_null() => Ok((column.clone(), value.clone())),
                _ => Err(Error::MissingKeyValue {
                    table: table.to_string(),
                    column: column.clone(),
                }),
            })
            .collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(col, _)| col.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A registered table.
#[derive(Debug, Clone)]
pub struct TableDef {
    database: String,
    name: String,
    alias: String,
    type_id: TypeId,
    type_name: &'static str,
    fields: Vec<Field>,
    columns: Vec<String>,
    attributes: BTreeMap<String, String>,
    primary_key: BTreeMap<String, String>,
    foreign_keys: BTreeMap<String, String>,
    keys: KeyExtractor,
}

impl TableDef {
    fn build<E: Entity>(alias: String) -> Self {
        let (database, name, fields) = E::declare().into_parts();
        let type_name = std::any::type_name::<E>();
        let name = name.unwrap_or_else(|| table_name_for(type_name));

        let mut attributes = BTreeMap::new();
        let mut primary_key = BTreeMap::new();
        let mut foreign_keys = BTreeMap::new();
        for field in fields.iter().filter(|f| f.is_stored()) {
            let column = field.column_name().to_string();
            attributes.insert(column.clone(), field.attr.clone());
            if field.primary_key {
                primary_key.insert(column.clone(), field.attr.clone());
            }
            if field.is_foreign_key() {
                foreign_keys.insert(column, field.attr.clone());
            }
        }
        let columns = attributes.keys().cloned().collect();
        let keys = KeyExtractor::build(&primary_key);

        Self {
            database,
            name,
            alias,
            type_id: TypeId::of::<E>(),
            type_name,
            fields,
            columns,
            attributes,
            primary_key,
            foreign_keys,
            keys,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias used in rendered SQL, e.g. `t1`.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether this table belongs to entity type `E`.
    pub fn is<E: Entity>(&self) -> bool {
        self.type_id == TypeId::of::<E>()
    }

    /// All fields in declaration order, relations included.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Stored fields in declaration order.
    pub fn stored_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_stored())
    }

    /// Storage column names, sorted.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Attribute declaring a storage column.
    pub fn attribute(&self, column: &str) -> Option<&str> {
        self.attributes.get(column).map(String::as_str)
    }

    pub fn field(&self, attr: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.attr == attr)
    }

    /// Field by attribute name, or error.
    pub fn require_field(&self, attr: &str) -> Result<&Field> {
        self.field(attr).ok_or_else(|| Error::UnknownField {
            table: self.name.clone(),
            field: attr.to_string(),
        })
    }

    pub fn field_by_column(&self, column: &str) -> Option<&Field> {
        self.attribute(column).and_then(|attr| self.field(attr))
    }

    /// Field by attribute name, falling back to storage column name.
    pub fn lookup(&self, name: &str) -> Option<&Field> {
        self.field(name).or_else(|| self.field_by_column(name))
    }

    /// Primary-key `(column, attribute)` pairs sorted by column.
    pub fn primary_key(&self) -> impl Iterator<Item = (&str, &str)> {
        self.primary_key
            .iter()
            .map(|(col, attr)| (col.as_str(), attr.as_str()))
    }

    pub fn primary_key_fields(&self) -> impl Iterator<Item = &Field> {
        self.primary_key.values().filter_map(|attr| self.field(attr))
    }

    /// Foreign-key fields sorted by column.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &Field> {
        self.foreign_keys.values().filter_map(|attr| self.field(attr))
    }

    pub fn key_extractor(&self) -> &KeyExtractor {
        &self.keys
    }

    /// Primary-key `(column, value)` pairs of an instance.
    pub fn key_values(&self, slots: &Slots) -> Result<Vec<(String, Value)>> {
        self.keys.extract(&self.name, slots)
    }

    /// Relation declared under `attr`.
    pub fn relation(&self, attr: &str) -> Result<&Relation> {
        self.require_field(attr)?.as_relation().ok_or_else(|| {
            Error::UnsupportedOperation(format!("{}.{attr} is not a relation", self.name))
        })
    }

    /// Fail with the first reference still unresolved, if any.
    pub fn ensure_resolved(&self) -> Result<()> {
        match self.pending_references().into_iter().next() {
            Some(reference) => Err(Error::UnresolvedReference {
                owner: self.name.clone(),
                reference,
            }),
            None => Ok(()),
        }
    }

    fn pending_references(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter_map(|field| match &field.kind {
                FieldKind::ForeignKey(reference) if !reference.is_resolved() => {
                    Some(format!("{} -> {}", field.attr, reference.describe()))
                }
                FieldKind::Relation(relation) if !relation.is_resolved() => {
                    Some(format!("{} ({})", field.attr, relation.kind().as_str()))
                }
                _ => None,
            })
            .collect()
    }

    /// Build a fresh instance from a row laid out in [`TableDef::columns`]
    /// order.
    pub fn hydrate<E: Entity>(&self, row: &Row) -> Result<E> {
        let mut entity = E::default();
        self.hydrate_into(&mut entity, row)?;
        Ok(entity)
    }

    /// Write a row laid out in [`TableDef::columns`] order into an
    /// existing instance.
    pub fn hydrate_into<E: Entity>(&self, entity: &mut E, row: &Row) -> Result<()> {
        if !self.is::<E>() {
            return Err(Error::Hydration {
                table: self.name.clone(),
                reason: format!("row cannot map onto {}", std::any::type_name::<E>()),
            });
        }
        if row.len() != self.columns.len() {
            return Err(Error::Hydration {
                table: self.name.clone(),
                reason: format!(
                    "expected {} values, got {}",
                    self.columns.len(),
                    row.len()
                ),
            });
        }
        for (column, value) in self.columns.iter().zip(row.values()) {
            let field = self.field_by_column(column).ok_or_else(|| Error::Hydration {
                table: self.name.clone(),
                reason: format!("no field for column {column}"),
            })?;
            field.assign(&self.name, entity.slots_mut(), value.clone())?;
        }
        Ok(())
    }

    fn summary(&self) -> TableSummary {
        TableSummary {
            name: self.name.clone(),
            alias: self.alias.clone(),
            columns: self
                .stored_fields()
                .map(|f| ColumnSummary {
                    name: f.column_name().to_string(),
                    attribute: f.attr.clone(),
                    sql_type: f.sql_type,
                    nullable: f.nullable,
                    unique: f.unique,
                })
                .collect(),
            primary_key: self.primary_key.keys().cloned().collect(),
            foreign_keys: self
                .foreign_keys()
                .map(|f| {
                    let target = f.reference().map(Reference::describe).unwrap_or_default();
                    (f.column_name().to_string(), target)
                })
                .collect(),
        }
    }
}

/// Serializable description of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub attribute: String,
    pub sql_type: Option<SqlType>,
    pub nullable: bool,
    pub unique: bool,
}

/// Serializable description of a registered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub alias: String,
    pub columns: Vec<ColumnSummary>,
    pub primary_key: Vec<String>,
    /// Foreign-key column to `"table.field"` target.
    pub foreign_keys: BTreeMap<String, String>,
}

/// Outcome of a finalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Finalized {
    /// References resolved during this pass.
    pub resolved: usize,
    /// `(table, reference)` pairs still pending.
    pub unresolved: Vec<(String, String)>,
}

impl Finalized {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

#[derive(Debug, Default)]
struct Database {
    tables: Vec<TableDef>,
    index: HashMap<String, usize>,
}

enum Resolution {
    ForeignKey {
        database: String,
        table: usize,
        field: usize,
        target: ResolvedRef,
        sql_type: SqlType,
    },
    Relation {
        database: String,
        table: usize,
        field: usize,
        relation: Relation,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    InProgress,
    Done,
}

/// Database name to table definitions.
#[derive(Debug)]
pub struct Namespace {
    databases: HashMap<String, Database>,
    types: HashMap<TypeId, (String, String)>,
    next_alias: u32,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl Namespace {
    pub fn new() -> Self {
        Self {
            databases: HashMap::new(),
            types: HashMap::new(),
            next_alias: 1,
        }
    }

    /// Register entity `E` under its declared database and table name.
    #[tracing::instrument(level = "debug", skip(self), fields(entity = std::any::type_name::<E>()))]
    pub fn register<E: Entity>(&mut self) -> Result<&TableDef> {
        let alias = format!("t{}", self.next_alias);
        let table = TableDef::build::<E>(alias);
        let taken = self
            .databases
            .get(&table.database)
            .is_some_and(|database| database.index.contains_key(&table.name));
        if taken || self.types.contains_key(&table.type_id) {
            return Err(Error::DuplicateTable {
                database: table.database,
                table: table.name,
            });
        }
        self.next_alias += 1;

        tracing::info!(
            database = %table.database,
            table = %table.name,
            alias = %table.alias,
            columns = table.columns.len(),
            "Registered table"
        );

        self.types.insert(
            table.type_id,
            (table.database.clone(), table.name.clone()),
        );
        let database = self.databases.entry(table.database.clone()).or_default();
        let idx = database.tables.len();
        database.index.insert(table.name.clone(), idx);
        database.tables.push(table);
        Ok(&database.tables[idx])
    }

    /// Resolve every reference whose target is registered.
    ///
    /// Safe to call repeatedly: references left pending because their
    /// target is not registered yet are logged and kept for a later pass.
    pub fn finalize(&mut self) -> Finalized {
        let mut report = Finalized::default();
        loop {
            let plan = self.plan();
            if plan.is_empty() {
                break;
            }
            report.resolved += plan.len();
            for step in plan {
                self.apply(step);
            }
        }

        let mut names: Vec<&String> = self.databases.keys().collect();
        names.sort();
        for name in names {
            for table in &self.databases[name].tables {
                for reference in table.pending_references() {
                    tracing::warn!(
                        database = %name,
                        table = %table.name,
                        reference = %reference,
                        "Reference left unresolved"
                    );
                    report.unresolved.push((table.name.clone(), reference));
                }
            }
        }
        report
    }

    fn plan(&self) -> Vec<Resolution> {
        let mut plan = Vec::new();
        for (db_name, database) in &self.databases {
            for (table_idx, table) in database.tables.iter().enumerate() {
                for (field_idx, field) in table.fields.iter().enumerate() {
                    match &field.kind {
                        FieldKind::ForeignKey(Reference::Unresolved(target)) => {
                            let Some(owner) = self.owner_of(db_name, target.table.as_ref(), table)
                            else {
                                continue;
                            };
                            let Some(target_field) = owner.lookup(&target.field) else {
                                continue;
                            };
                            // A chain of keys resolves once its head has a type.
                            let Some(sql_type) = target_field.sql_type else {
                                continue;
                            };
                            if !target_field.is_stored() {
                                continue;
                            }
                            plan.push(Resolution::ForeignKey {
                                database: db_name.clone(),
                                table: table_idx,
                                field: field_idx,
                                target: ResolvedRef {
                                    database: owner.database.clone(),
                                    table: owner.name.clone(),
                                    field: target_field.attr.clone(),
                                    column: target_field.column_name().to_string(),
                                },
                                sql_type,
                            });
                        }
                        FieldKind::Relation(relation) if !relation.is_resolved() => {
                            if let Some(relation) = self.resolve_relation(db_name, table, relation)
                            {
                                plan.push(Resolution::Relation {
                                    database: db_name.clone(),
                                    table: table_idx,
                                    field: field_idx,
                                    relation,
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        plan
    }

    /// A copy of `relation` with every resolvable part resolved, or `None`
    /// if nothing changed.
    fn resolve_relation(
        &self,
        database: &str,
        owner: &TableDef,
        relation: &Relation,
    ) -> Option<Relation> {
        match relation {
            Relation::OneToOne { foreign_key } | Relation::OneToMany { foreign_key } => {
                let Reference::Unresolved(target) = foreign_key else {
                    return None;
                };
                let table = self.owner_of(database, target.table.as_ref(), owner)?;
                let field = table.lookup(&target.field)?;
                if !field.is_foreign_key() {
                    return None;
                }
                let resolved = Reference::Resolved(ResolvedRef {
                    database: table.database.clone(),
                    table: table.name.clone(),
                    field: field.attr.clone(),
                    column: field.column_name().to_string(),
                });
                Some(match relation {
                    Relation::OneToOne { .. } => Relation::OneToOne {
                        foreign_key: resolved,
                    },
                    _ => Relation::OneToMany {
                        foreign_key: resolved,
                    },
                })
            }
            Relation::ManyToMany {
                foreign_table,
                secondary,
            } => {
                let new_foreign = self.resolve_link(database, foreign_table);
                let new_secondary = self.resolve_link(database, secondary);
                if new_foreign == *foreign_table && new_secondary == *secondary {
                    return None;
                }
                Some(Relation::ManyToMany {
                    foreign_table: new_foreign,
                    secondary: new_secondary,
                })
            }
        }
    }

    fn resolve_link(&self, database: &str, link: &TableLink) -> TableLink {
        match link {
            TableLink::Unresolved(target) => match self.find(database, target) {
                Some(table) => TableLink::Resolved {
                    database: table.database.clone(),
                    table: table.name.clone(),
                },
                None => link.clone(),
            },
            TableLink::Resolved { .. } => link.clone(),
        }
    }

    fn apply(&mut self, step: Resolution) {
        match step {
            Resolution::ForeignKey {
                database,
                table,
                field,
                target,
                sql_type,
            } => {
                if let Some(db) = self.databases.get_mut(&database) {
                    let field = &mut db.tables[table].fields[field];
                    tracing::debug!(
                        field = %field.attr,
                        target = %format!("{}.{}", target.table, target.field),
                        "Resolved foreign key"
                    );
                    field.resolve_foreign_key(target, sql_type);
                }
            }
            Resolution::Relation {
                database,
                table,
                field,
                relation,
            } => {
                if let Some(db) = self.databases.get_mut(&database) {
                    db.tables[table].fields[field].kind = FieldKind::Relation(relation);
                }
            }
        }
    }

    /// The table a reference points into; `None` means the owner itself.
    fn owner_of<'a>(
        &'a self,
        database: &str,
        target: Option<&TableTarget>,
        owner: &'a TableDef,
    ) -> Option<&'a TableDef> {
        match target {
            Some(target) => self.find(database, target),
            None => Some(owner),
        }
    }

    fn find(&self, database: &str, target: &TableTarget) -> Option<&TableDef> {
        match target {
            TableTarget::Named(name) => self.get(database, name),
            TableTarget::Typed { type_id, .. } => self.by_type(*type_id),
        }
    }

    fn get(&self, database: &str, name: &str) -> Option<&TableDef> {
        let db = self.databases.get(database)?;
        db.index.get(name).map(|&idx| &db.tables[idx])
    }

    fn by_type(&self, type_id: TypeId) -> Option<&TableDef> {
        let (database, name) = self.types.get(&type_id)?;
        self.get(database, name)
    }

    /// Table registered as `name` in `database`.
    pub fn table(&self, database: &str, name: &str) -> Result<&TableDef> {
        self.get(database, name).ok_or_else(|| Error::UnknownTable {
            table: format!("{database}.{name}"),
        })
    }

    /// Table registered for entity type `E`.
    pub fn table_of<E: Entity>(&self) -> Result<&TableDef> {
        self.by_type(TypeId::of::<E>())
            .ok_or_else(|| Error::UnknownTable {
                table: std::any::type_name::<E>().to_string(),
            })
    }

    /// Table a target points to, looked up by name within `database`.
    pub fn resolve_table(&self, database: &str, target: &TableTarget) -> Result<&TableDef> {
        self.find(database, target).ok_or_else(|| Error::UnresolvedReference {
            owner: database.to_string(),
            reference: target.describe().to_string(),
        })
    }

    /// Table behind a resolved reference or link.
    pub fn table_by_ref(&self, reference: &ResolvedRef) -> Result<&TableDef> {
        self.table(&reference.database, &reference.table)
    }

    /// Database names, sorted.
    pub fn databases(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.databases.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Tables in dependency order: every table appears after the tables
    /// it references. Self-references are ignored; any other cycle fails.
    pub fn list_tables(&self, database: &str) -> Result<Vec<&TableDef>> {
        let Some(db) = self.databases.get(database) else {
            return Ok(Vec::new());
        };
        let mut state = vec![Visit::Pending; db.tables.len()];
        let mut stack = Vec::new();
        let mut order = Vec::with_capacity(db.tables.len());
        for idx in 0..db.tables.len() {
            if state[idx] == Visit::Pending {
                self.visit(db, idx, &mut state, &mut stack, &mut order)?;
            }
        }
        Ok(order.into_iter().map(|idx| &db.tables[idx]).collect())
    }

    fn visit(
        &self,
        db: &Database,
        idx: usize,
        state: &mut [Visit],
        stack: &mut Vec<usize>,
        order: &mut Vec<usize>,
    ) -> Result<()> {
        state[idx] = Visit::InProgress;
        stack.push(idx);
        let table = &db.tables[idx];
        for field in table.foreign_keys() {
            let Some(target) = self.dependency(db, table, field) else {
                continue;
            };
            if target == idx {
                continue;
            }
            match state[target] {
                Visit::Done => {}
                Visit::Pending => self.visit(db, target, state, stack, order)?,
                Visit::InProgress => {
                    let start = stack.iter().position(|&i| i == target).unwrap_or(0);
                    let mut tables: Vec<String> = stack[start..]
                        .iter()
                        .map(|&i| db.tables[i].name.clone())
                        .collect();
                    tables.push(db.tables[target].name.clone());
                    return Err(Error::CyclicReference { tables });
                }
            }
        }
        stack.pop();
        state[idx] = Visit::Done;
        order.push(idx);
        Ok(())
    }

    /// Index of the table a foreign key depends on, within the same database.
    fn dependency(&self, db: &Database, owner: &TableDef, field: &Field) -> Option<usize> {
        let name = match field.reference()? {
            Reference::Resolved(r) if r.database == owner.database => r.table.clone(),
            Reference::Resolved(_) => return None,
            Reference::Unresolved(target) => match target.table.as_ref()? {
                TableTarget::Named(name) => name.clone(),
                TableTarget::Typed { type_id, .. } => {
                    let (database, name) = self.types.get(type_id)?;
                    if *database != owner.database {
                        return None;
                    }
                    name.clone()
                }
            },
        };
        db.index.get(&name).copied()
    }

    /// Assign `related` to the one-to-one relation `attr` of `entity` by
    /// copying the referenced key into the local foreign key.
    pub fn assign_related<E: Entity, T: Entity>(
        &self,
        entity: &mut E,
        attr: &str,
        related: &T,
    ) -> Result<()> {
        let table = self.table_of::<E>()?;
        let relation = table.relation(attr)?;
        let Relation::OneToOne { foreign_key } = relation else {
            return Err(Error::UnsupportedOperation(format!(
                "cannot assign {} relation {}.{attr}",
                relation.kind().as_str(),
                table.name
            )));
        };
        let fk = foreign_key.resolved().ok_or_else(|| Error::UnresolvedReference {
            owner: table.name.clone(),
            reference: foreign_key.describe(),
        })?;
        if fk.table != table.name {
            return Err(Error::UnsupportedOperation(format!(
                "{}.{attr} is assigned from {}",
                table.name, fk.table
            )));
        }
        let fk_field = table.require_field(&fk.field)?;
        let target = fk_field
            .reference()
            .and_then(Reference::resolved)
            .ok_or_else(|| Error::UnresolvedReference {
                owner: table.name.clone(),
                reference: fk_field.attr.clone(),
            })?;
        let related_table = self.table_of::<T>()?;
        if related_table.name != target.table || related_table.database != target.database {
            return Err(Error::UnsupportedOperation(format!(
                "{}.{attr} expects a {} instance",
                table.name, target.table
            )));
        }
        fk_field.assign(&table.name, entity.slots_mut(), related.get(&target.field))
    }

    /// Serializable snapshot of a database's tables, in dependency order
    /// when possible.
    pub fn summary(&self, database: &str) -> Vec<TableSummary> {
        match self.list_tables(database) {
            Ok(tables) => tables.into_iter().map(TableDef::summary).collect(),
            Err(_) => self
                .databases
                .get(database)
                .map(|db| db.tables.iter().map(TableDef::summary).collect())
                .unwrap_or_default(),
        }
    }

    /// Remove a database and its tables. Returns the number of tables
    /// dropped.
    pub fn drop_database(&mut self, database: &str) -> usize {
        let Some(db) = self.databases.remove(database) else {
            return 0;
        };
        for table in &db.tables {
            self.types.remove(&table.type_id);
        }
        tracing::info!(database = %database, tables = db.tables.len(), "Dropped database namespace");
        db.tables.len()
    }
}
