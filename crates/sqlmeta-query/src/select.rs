//! Reading statements: `Get`, `Select` and `Count`.
//!
//! Execution is a two-step protocol: one async call fetches every row into
//! memory, then [`ResultSet`] maps rows onto entities synchronously and can
//! be iterated any number of times.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use asupersync::{Cx, Outcome};
use sqlmeta_core::{
    Cursor, Driver, DriverRegistry, Entity, Error, Namespace, Result, Row, ScopedCursor,
    TableDef, Value, try_outcome, try_result,
};

use crate::dialect::Renderer;
use crate::expr::Col;
use crate::statement::{Chain, Chained};

/// Execute one statement and fetch all of its rows.
pub(crate) async fn fetch_all<C: Cursor>(
    cx: &Cx,
    cursor: &mut C,
    sql: &str,
    params: &[Value],
) -> Outcome<Vec<Row>, Error> {
    tracing::debug!(sql = %sql, params = ?params, "Executing statement");
    try_outcome!(cursor.execute(cx, sql, params).await);
    cursor.fetchall(cx).await
}

/// Execute one statement and fetch its first row, if any.
pub(crate) async fn fetch_one<C: Cursor>(
    cx: &Cx,
    cursor: &mut C,
    sql: &str,
    params: &[Value],
) -> Outcome<Option<Row>, Error> {
    tracing::debug!(sql = %sql, params = ?params, "Executing statement");
    try_outcome!(cursor.execute(cx, sql, params).await);
    cursor.fetchone(cx).await
}

/// Execute one statement that returns no rows.
pub(crate) async fn execute<C: Cursor>(
    cx: &Cx,
    cursor: &mut C,
    sql: &str,
    params: &[Value],
) -> Outcome<(), Error> {
    tracing::debug!(sql = %sql, params = ?params, "Executing statement");
    cursor.execute(cx, sql, params).await
}

/// Scoped cursor from the driver registered under `database`.
pub(crate) async fn scoped_cursor<'d, D: Driver>(
    cx: &Cx,
    drivers: &'d DriverRegistry<D>,
    database: &str,
) -> Outcome<ScopedCursor<'d, D>, Error> {
    let driver = try_result!(drivers.get(database));
    driver.cursor(cx).await
}

/// Rows of one table, hydrated on demand.
#[derive(Debug)]
pub struct ResultSet<'a, E: Entity> {
    table: &'a TableDef,
    rows: Vec<Row>,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> ResultSet<'a, E> {
    pub fn new(table: &'a TableDef, rows: Vec<Row>) -> Self {
        Self {
            table,
            rows,
            _entity: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// A fresh entity per row, in row order. Every call starts over.
    pub fn iter(&self) -> impl Iterator<Item = Result<E>> + '_ {
        self.rows.iter().map(|row| self.table.hydrate::<E>(row))
    }

    pub fn first(&self) -> Result<Option<E>> {
        self.rows
            .first()
            .map(|row| self.table.hydrate::<E>(row))
            .transpose()
    }

    pub fn into_vec(self) -> Result<Vec<E>> {
        self.iter().collect()
    }
}

/// `SELECT` of every column of `E`, refined by modifiers.
#[derive(Debug)]
pub struct Select<E: Entity> {
    chain: Chain,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for Select<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Chained for Select<E> {
    fn chain_mut(&mut self) -> &mut Chain {
        &mut self.chain
    }
}

impl<E: Entity> Select<E> {
    pub fn new() -> Self {
        Self {
            chain: Chain::default(),
            _entity: PhantomData,
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Render SQL text and parameters. Rendering has no side effects and
    /// can be repeated.
    pub fn build(&self, ns: &Namespace) -> Result<(String, Vec<Value>)> {
        let mut renderer = Renderer::for_entity::<E>(ns)?;
        renderer.render_select(&self.chain)?;
        Ok(renderer.finish())
    }

    /// Run on an explicit cursor, e.g. an open transaction.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn run_on<'ns, C: Cursor>(
        &self,
        cx: &Cx,
        ns: &'ns Namespace,
        cursor: &mut C,
    ) -> Outcome<ResultSet<'ns, E>, Error> {
        let table = try_result!(ns.table_of::<E>());
        let (sql, params) = try_result!(self.build(ns));
        let rows = try_outcome!(fetch_all(cx, cursor, &sql, &params).await);
        Outcome::Ok(ResultSet::new(table, rows))
    }

    /// First matching row, or `None`.
    pub async fn first_on<C: Cursor>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        cursor: &mut C,
    ) -> Outcome<Option<E>, Error> {
        let table = try_result!(ns.table_of::<E>());
        let (sql, params) = try_result!(self.build(ns));
        match try_outcome!(fetch_one(cx, cursor, &sql, &params).await) {
            Some(row) => Outcome::Ok(Some(try_result!(table.hydrate::<E>(&row)))),
            None => Outcome::Ok(None),
        }
    }

    /// Run on a scoped cursor from the driver bound to `E`'s database.
    pub async fn run<'ns, D: Driver>(
        &self,
        cx: &Cx,
        ns: &'ns Namespace,
        drivers: &DriverRegistry<D>,
    ) -> Outcome<ResultSet<'ns, E>, Error> {
        let table = try_result!(ns.table_of::<E>());
        let mut cursor = try_outcome!(scoped_cursor(cx, drivers, table.database()).await);
        self.run_on(cx, ns, &mut cursor).await
    }

    pub async fn first<D: Driver>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        drivers: &DriverRegistry<D>,
    ) -> Outcome<Option<E>, Error> {
        let table = try_result!(ns.table_of::<E>());
        let mut cursor = try_outcome!(scoped_cursor(cx, drivers, table.database()).await);
        self.first_on(cx, ns, &mut cursor).await
    }
}

/// Primary-key lookup. Key values are given either positionally (single
/// column keys only) or by attribute name, never both.
#[derive(Debug)]
pub struct Get<E: Entity> {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
    chain: Chain,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for Get<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Chained for Get<E> {
    fn chain_mut(&mut self) -> &mut Chain {
        &mut self.chain
    }
}

impl<E: Entity> Get<E> {
    pub fn new() -> Self {
        Self {
            positional: Vec::new(),
            named: Vec::new(),
            chain: Chain::default(),
            _entity: PhantomData,
        }
    }

    /// Lookup by a single positional key value.
    pub fn by_key(value: impl Into<Value>) -> Self {
        Self::new().positional(value)
    }

    /// Lookup by named key values.
    pub fn by_keys<K: Into<String>, V: Into<Value>>(
        keys: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        keys.into_iter()
            .fold(Self::new(), |get, (name, value)| get.key(name, value))
    }

    pub fn positional(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add a named key value; `name` is an attribute or column name.
    pub fn key(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    /// `(column, value)` pairs in key column order.
    fn key_pairs(&self, table: &TableDef) -> Result<Vec<(String, Value)>> {
        let ambiguous = |reason: &str| Error::AmbiguousKey {
            table: table.name().to_string(),
            reason: reason.to_string(),
        };
        let extractor = table.key_extractor();
        if extractor.is_empty() {
            return Err(ambiguous("table has no primary key"));
        }
        if !self.positional.is_empty() && !self.named.is_empty() {
            return Err(ambiguous("both positional and named key values given"));
        }
        if !self.positional.is_empty() {
            if extractor.len() > 1 {
                return Err(ambiguous("composite key needs named values"));
            }
            if self.positional.len() > 1 {
                return Err(ambiguous("more than one positional key value"));
            }
            return Ok(extractor
                .columns()
                .map(str::to_string)
                .zip(self.positional.iter().cloned())
                .collect());
        }

        let mut given = BTreeMap::new();
        for (name, value) in &self.named {
            let field = table.lookup(name).ok_or_else(|| Error::UnknownField {
                table: table.name().to_string(),
                field: name.clone(),
            })?;
            if !field.primary_key {
                return Err(ambiguous(&format!("{name} is not part of the primary key")));
            }
            given.insert(field.column_name().to_string(), value.clone());
        }
        extractor
            .columns()
            .map(|column| {
                given
                    .remove(column)
                    .filter(|v| !v.is_null())
                    .map(|v| (column.to_string(), v))
                    .ok_or_else(|| Error::MissingKeyValue {
                        table: table.name().to_string(),
                        column: column.to_string(),
                    })
            })
            .collect()
    }

    pub fn build(&self, ns: &Namespace) -> Result<(String, Vec<Value>)> {
        let mut renderer = Renderer::for_entity::<E>(ns)?;
        let key = self.key_pairs(renderer.root())?;
        renderer.render_get(&key, &self.chain)?;
        Ok(renderer.finish())
    }

    /// The matching entity, or `None` when no row matches.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn run_on<C: Cursor>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        cursor: &mut C,
    ) -> Outcome<Option<E>, Error> {
        let table = try_result!(ns.table_of::<E>());
        let (sql, params) = try_result!(self.build(ns));
        match try_outcome!(fetch_one(cx, cursor, &sql, &params).await) {
            Some(row) => Outcome::Ok(Some(try_result!(table.hydrate::<E>(&row)))),
            None => Outcome::Ok(None),
        }
    }

    pub async fn run<D: Driver>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        drivers: &DriverRegistry<D>,
    ) -> Outcome<Option<E>, Error> {
        let table = try_result!(ns.table_of::<E>());
        let mut cursor = try_outcome!(scoped_cursor(cx, drivers, table.database()).await);
        self.run_on(cx, ns, &mut cursor).await
    }
}

/// `SELECT COUNT(...)` over `E`'s table.
#[derive(Debug)]
pub struct Count<E: Entity> {
    column: Option<Col>,
    chain: Chain,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for Count<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E: Entity> Chained for Count<E> {
    fn chain_mut(&mut self) -> &mut Chain {
        &mut self.chain
    }
}

impl<E: Entity> Count<E> {
    /// `COUNT(*)`
    pub fn all() -> Self {
        Self {
            column: None,
            chain: Chain::default(),
            _entity: PhantomData,
        }
    }

    /// `COUNT(alias."column")`, skipping NULLs.
    pub fn column(column: Col) -> Self {
        Self {
            column: Some(column),
            ..Self::all()
        }
    }

    pub fn build(&self, ns: &Namespace) -> Result<(String, Vec<Value>)> {
        let mut renderer = Renderer::for_entity::<E>(ns)?;
        renderer.render_count(self.column.as_ref(), &self.chain)?;
        Ok(renderer.finish())
    }

    pub async fn run_on<C: Cursor>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        cursor: &mut C,
    ) -> Outcome<i64, Error> {
        let (sql, params) = try_result!(self.build(ns));
        let returned = try_outcome!(fetch_one(cx, cursor, &sql, &params).await);
        let table = try_result!(ns.table_of::<E>()).name().to_string();
        let Some(row) = returned else {
            return Outcome::Err(Error::NoRowReturned { table });
        };
        match row.get(0).and_then(Value::as_i64) {
            Some(count) => Outcome::Ok(count),
            None => Outcome::Err(Error::Hydration {
                table,
                reason: format!("count returned a non-integer value: {:?}", row.get(0)),
            }),
        }
    }

    pub async fn run<D: Driver>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        drivers: &DriverRegistry<D>,
    ) -> Outcome<i64, Error> {
        let table = try_result!(ns.table_of::<E>());
        let mut cursor = try_outcome!(scoped_cursor(cx, drivers, table.database()).await);
        self.run_on(cx, ns, &mut cursor).await
    }
}
