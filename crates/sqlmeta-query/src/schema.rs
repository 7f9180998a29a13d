//! Table creation DDL.
//!
//! Columns are laid out primary key first, then foreign keys, then the rest,
//! each group sorted by column name so output is deterministic. Constraints
//! follow the columns: the primary key, one foreign key constraint per
//! foreign key column and one unique constraint per unique column.

use std::marker::PhantomData;

use asupersync::{Cx, Outcome};
use sqlmeta_core::{
    Cursor, DefaultValue, Driver, DriverRegistry, Entity, Error, Field, Namespace, Reference,
    Result, SqlType, TableDef, quote_ident, try_outcome, try_result,
};

use crate::dialect::Renderer;
use crate::select::{execute, scoped_cursor};

/// Renders `CREATE TABLE` statements for one SQL dialect.
pub trait DdlGenerator {
    /// Dialect name for logging.
    fn dialect(&self) -> &'static str;

    /// Column type spelling for a stored field.
    fn column_type(&self, field: &Field) -> Result<String>;

    /// Full `CREATE TABLE IF NOT EXISTS` statement for `table`.
    fn create_table(&self, table: &TableDef) -> Result<String>;
}

/// DDL generator for PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDdlGenerator;

impl DdlGenerator for PostgresDdlGenerator {
    fn dialect(&self) -> &'static str {
        "postgresql"
    }

    fn column_type(&self, field: &Field) -> Result<String> {
        let sql_type = field.sql_type.ok_or_else(|| Error::UnsupportedOperation(format!(
            "{} has no column type",
            field.attr
        )))?;
        Ok(match sql_type {
            SqlType::Integer if field.autoincrement => "serial".to_string(),
            SqlType::Integer => "int".to_string(),
            SqlType::Boolean => "boolean".to_string(),
            SqlType::String { length: Some(n) } => format!("varchar({n})"),
            SqlType::String { length: None } => "varchar".to_string(),
            SqlType::Text => "text".to_string(),
            SqlType::Timestamp {
                with_timezone: true,
            } => "timestamp with time zone".to_string(),
            SqlType::Timestamp {
                with_timezone: false,
            } => "timestamp without time zone".to_string(),
            SqlType::Uuid => "uuid".to_string(),
            SqlType::CaseInsensitiveText => "citext".to_string(),
            SqlType::Json => "jsonb".to_string(),
        })
    }

    fn create_table(&self, table: &TableDef) -> Result<String> {
        tracing::debug!(dialect = self.dialect(), table = %table.name(), "Generating DDL");
        table.ensure_resolved()?;

        let mut primary: Vec<&Field> = table.primary_key_fields().collect();
        let mut foreign: Vec<&Field> = table
            .foreign_keys()
            .filter(|f| !f.primary_key)
            .collect();
        let mut plain: Vec<&Field> = table
            .stored_fields()
            .filter(|f| !f.primary_key && !f.is_foreign_key())
            .collect();
        for group in [&mut primary, &mut foreign, &mut plain] {
            group.sort_by(|a, b| a.column_name().cmp(b.column_name()));
        }

        let mut lines = Vec::new();
        for field in primary.iter().chain(&foreign).chain(&plain) {
            lines.push(format!("  {}", self.column_definition(field)?));
        }
        if !primary.is_empty() {
            let columns: Vec<String> = primary
                .iter()
                .map(|f| quote_ident(f.column_name()))
                .collect();
            lines.push(format!("  PRIMARY KEY ({})", columns.join(", ")));
        }
        for field in table.foreign_keys() {
            let Some(Reference::Resolved(target)) = field.reference() else {
                continue;
            };
            let column = field.column_name();
            lines.push(format!(
                "  CONSTRAINT {} FOREIGN KEY ({})\n    REFERENCES {} ({}) MATCH SIMPLE ON UPDATE NO ACTION ON DELETE NO ACTION",
                quote_ident(&format!("{}_{column}_fkey", table.name())),
                quote_ident(column),
                quote_ident(&target.table),
                quote_ident(&target.column)
            ));
        }
        let mut unique: Vec<&Field> = table.stored_fields().filter(|f| f.unique).collect();
        unique.sort_by(|a, b| a.column_name().cmp(b.column_name()));
        for field in unique {
            let column = field.column_name();
            lines.push(format!(
                "  CONSTRAINT {} UNIQUE ({})",
                quote_ident(&format!("{}_{column}_key", table.name())),
                quote_ident(column)
            ));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            quote_ident(table.name()),
            lines.join(",\n")
        ))
    }
}

impl PostgresDdlGenerator {
    fn column_definition(&self, field: &Field) -> Result<String> {
        let mut definition = format!(
            "{} {}",
            quote_ident(field.column_name()),
            self.column_type(field)?
        );
        if !field.nullable {
            definition.push_str(" NOT NULL");
        }
        match &field.default {
            Some(DefaultValue::Value(value)) => {
                definition.push_str(&format!(" DEFAULT {}", value.to_sql_literal()));
            }
            Some(DefaultValue::Function(function)) => {
                definition.push_str(&format!(" DEFAULT {}", Renderer::render_function(*function)));
            }
            None => {}
        }
        Ok(definition)
    }
}

/// `CREATE TABLE` for entity `E`.
#[derive(Debug)]
pub struct CreateTable<E: Entity> {
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for CreateTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> CreateTable<E> {
    pub fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }

    pub fn build(&self, ns: &Namespace) -> Result<String> {
        PostgresDdlGenerator.create_table(ns.table_of::<E>()?)
    }

    pub async fn run_on<C: Cursor>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        cursor: &mut C,
    ) -> Outcome<(), Error> {
        let sql = try_result!(self.build(ns));
        execute(cx, cursor, &sql, &[]).await
    }

    pub async fn run<D: Driver>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        drivers: &DriverRegistry<D>,
    ) -> Outcome<(), Error> {
        let table = try_result!(ns.table_of::<E>());
        let mut cursor = try_outcome!(scoped_cursor(cx, drivers, table.database()).await);
        self.run_on(cx, ns, &mut cursor).await
    }
}

/// `CREATE TABLE` for every table of a database, in dependency order.
#[derive(Debug, Clone)]
pub struct CreateSchema {
    database: String,
}

impl CreateSchema {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// One statement per table; referenced tables come first.
    pub fn build(&self, ns: &Namespace) -> Result<Vec<String>> {
        ns.list_tables(&self.database)?
            .into_iter()
            .map(|table| PostgresDdlGenerator.create_table(table))
            .collect()
    }

    #[tracing::instrument(level = "debug", skip(self, cx, ns, cursor), fields(database = %self.database))]
    pub async fn run_on<C: Cursor>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        cursor: &mut C,
    ) -> Outcome<(), Error> {
        let statements = try_result!(self.build(ns));
        for sql in &statements {
            try_outcome!(execute(cx, cursor, sql, &[]).await);
        }
        tracing::info!(database = %self.database, tables = statements.len(), "Created schema");
        Outcome::Ok(())
    }

    pub async fn run<D: Driver>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        drivers: &DriverRegistry<D>,
    ) -> Outcome<(), Error> {
        let mut cursor = try_outcome!(scoped_cursor(cx, drivers, &self.database).await);
        self.run_on(cx, ns, &mut cursor).await
    }
}
