//! Writing statements: `Insert`, `Update` and `Delete`.
//!
//! `Insert` and `Update` expect the database to return the written row and
//! hydrate it back into the instance they were given, so generated keys and
//! function defaults become visible to the caller. `Delete` only reports
//! success.

use asupersync::{Cx, Outcome};
use sqlmeta_core::{
    Cursor, Driver, DriverRegistry, Entity, Error, Namespace, Result, Value, try_outcome,
    try_result,
};

use crate::dialect::Renderer;
use crate::select::{execute, fetch_one, scoped_cursor};

/// Write the returned row into `entity`.
async fn write_back<E: Entity, C: Cursor>(
    cx: &Cx,
    ns: &Namespace,
    cursor: &mut C,
    entity: &mut E,
    statement: (String, Vec<Value>),
) -> Outcome<(), Error> {
    let table = try_result!(ns.table_of::<E>());
    let (sql, params) = statement;
    let returned = try_outcome!(fetch_one(cx, cursor, &sql, &params).await);
    let Some(row) = returned else {
        return Outcome::Err(Error::NoRowReturned {
            table: table.name().to_string(),
        });
    };
    try_result!(table.hydrate_into(entity, &row));
    Outcome::Ok(())
}

/// `INSERT ... RETURNING` for one instance.
#[derive(Debug)]
pub struct Insert<'a, E: Entity> {
    entity: &'a mut E,
}

impl<'a, E: Entity> Insert<'a, E> {
    pub fn new(entity: &'a mut E) -> Self {
        Self { entity }
    }

    pub fn build(&self, ns: &Namespace) -> Result<(String, Vec<Value>)> {
        let mut renderer = Renderer::for_entity::<E>(ns)?;
        renderer.render_insert(self.entity.slots())?;
        Ok(renderer.finish())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn run_on<C: Cursor>(
        self,
        cx: &Cx,
        ns: &Namespace,
        cursor: &mut C,
    ) -> Outcome<(), Error> {
        let statement = try_result!(self.build(ns));
        write_back(cx, ns, cursor, self.entity, statement).await
    }

    pub async fn run<D: Driver>(
        self,
        cx: &Cx,
        ns: &Namespace,
        drivers: &DriverRegistry<D>,
    ) -> Outcome<(), Error> {
        let table = try_result!(ns.table_of::<E>());
        let mut cursor = try_outcome!(scoped_cursor(cx, drivers, table.database()).await);
        self.run_on(cx, ns, &mut cursor).await
    }
}

/// `UPDATE ... WHERE <primary key> RETURNING` for one instance.
#[derive(Debug)]
pub struct Update<'a, E: Entity> {
    entity: &'a mut E,
}

impl<'a, E: Entity> Update<'a, E> {
    pub fn new(entity: &'a mut E) -> Self {
        Self { entity }
    }

    pub fn build(&self, ns: &Namespace) -> Result<(String, Vec<Value>)> {
        let mut renderer = Renderer::for_entity::<E>(ns)?;
        renderer.render_update(self.entity.slots())?;
        Ok(renderer.finish())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn run_on<C: Cursor>(
        self,
        cx: &Cx,
        ns: &Namespace,
        cursor: &mut C,
    ) -> Outcome<(), Error> {
        let statement = try_result!(self.build(ns));
        write_back(cx, ns, cursor, self.entity, statement).await
    }

    pub async fn run<D: Driver>(
        self,
        cx: &Cx,
        ns: &Namespace,
        drivers: &DriverRegistry<D>,
    ) -> Outcome<(), Error> {
        let table = try_result!(ns.table_of::<E>());
        let mut cursor = try_outcome!(scoped_cursor(cx, drivers, table.database()).await);
        self.run_on(cx, ns, &mut cursor).await
    }
}

/// `DELETE ... WHERE <primary key>` for one instance.
#[derive(Debug)]
pub struct Delete<'a, E: Entity> {
    entity: &'a E,
}

impl<'a, E: Entity> Delete<'a, E> {
    pub fn new(entity: &'a E) -> Self {
        Self { entity }
    }

    pub fn build(&self, ns: &Namespace) -> Result<(String, Vec<Value>)> {
        let mut renderer = Renderer::for_entity::<E>(ns)?;
        renderer.render_delete(self.entity.slots())?;
        Ok(renderer.finish())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn run_on<C: Cursor>(
        &self,
        cx: &Cx,
        ns: &Namespace,
        cursor: &mut C,
    ) -> Outcome<(), Error> {
        let (sql, params) = try_result!(self.build(ns));
        execute(cx, cursor, &sql, &params).await
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
