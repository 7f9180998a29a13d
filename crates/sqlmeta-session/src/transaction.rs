//! Explicit transactions over a driver connection.
//!
//! A [`Transaction`] moves `Unopened -> Open -> Closed`. It acquires one
//! cursor on `begin` and hands it back to the driver when it commits, rolls
//! back or is dropped. The release on commit and rollback happens even when
//! the verb itself fails or the future is abandoned mid-flight.

use std::future::Future;

use asupersync::{Cx, Outcome};
use sqlmeta_core::{
    Cursor, Driver, DriverRegistry, Error, Result, Row, ScopedCursor, Value, try_outcome,
};
use sqlmeta_query::Renderer;

/// Where a transaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Unopened,
    Open,
    /// Committed or rolled back. Terminal.
    Closed,
}

enum State<C> {
    Unopened,
    Open(C),
    Closed,
}

/// A transaction on one connection of `D`.
///
/// Implements [`Cursor`], so any statement's `run_on` can execute inside it.
/// The first `execute` opens the transaction implicitly.
pub struct Transaction<'d, D: Driver> {
    driver: &'d D,
    state: State<D::Cursor>,
}

impl<'d, D: Driver> Transaction<'d, D> {
    pub fn new(driver: &'d D) -> Self {
        Self {
            driver,
            state: State::Unopened,
        }
    }

    /// Transaction on the driver registered under `database`.
    pub fn from_registry(drivers: &'d DriverRegistry<D>, database: &str) -> Result<Self> {
        Ok(Self::new(drivers.get(database)?.as_ref()))
    }

    pub fn state(&self) -> TransactionState {
        match self.state {
            State::Unopened => TransactionState::Unopened,
            State::Open(_) => TransactionState::Open,
            State::Closed => TransactionState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open(_))
    }

    /// Acquire a connection and issue `BEGIN`. A no-op when already open.
    #[tracing::instrument(level = "debug", skip_all, fields(database = %self.driver.database()))]
    pub async fn begin(&mut self, cx: &Cx) -> Outcome<(), Error> {
        match self.state {
            State::Open(_) => return Outcome::Ok(()),
            State::Closed => {
                return Outcome::Err(Error::UnsupportedOperation(
                    "transaction is already closed".to_string(),
                ));
            }
            State::Unopened => {}
        }

        let cursor = try_outcome!(self.driver.acquire(cx).await);
        // Guarded until BEGIN succeeds; a failed or abandoned begin releases it.
        let mut cursor = ScopedCursor::new(self.driver, cursor);
        try_outcome!(
            cursor
                .execute(cx, Renderer::render_begin_transaction(), &[])
                .await
        );
        let Some(cursor) = cursor.detach() else {
            return Outcome::Err(Error::driver("cursor already released"));
        };
        tracing::info!(database = %self.driver.database(), "Transaction started");
        self.state = State::Open(cursor);
        Outcome::Ok(())
    }

    /// Issue `COMMIT` and release the connection.
    pub async fn commit(&mut self, cx: &Cx) -> Outcome<(), Error> {
        self.finish(cx, Renderer::render_commit_transaction()).await
    }

    /// Issue `ROLLBACK` and release the connection.
    pub async fn rollback(&mut self, cx: &Cx) -> Outcome<(), Error> {
        self.finish(cx, Renderer::render_rollback_transaction()).await
    }

    async fn finish(&mut self, cx: &Cx, verb: &'static str) -> Outcome<(), Error> {
        let cursor = match std::mem::replace(&mut self.state, State::Closed) {
            State::Open(cursor) => cursor,
            previous => {
                self.state = previous;
                return Outcome::Err(Error::TransactionNotStarted);
            }
        };
        // The guard hands the cursor back even if this future is dropped.
        let mut cursor = ScopedCursor::new(self.driver, cursor);
        let outcome = cursor.execute(cx, verb, &[]).await;
        cursor.release();

        let database = self.driver.database();
        match (&outcome, verb) {
            (Outcome::Ok(()), "COMMIT") => {
                tracing::info!(database = %database, "Transaction committed");
            }
            (Outcome::Ok(()), _) => {
                tracing::warn!(database = %database, "Transaction rolled back");
            }
            (Outcome::Err(e), _) => {
                tracing::warn!(database = %database, verb, error = %e, "Transaction close failed");
            }
            _ => {}
        }
        outcome
    }
}

impl<D: Driver> Drop for Transaction<'_, D> {
    fn drop(&mut self) {
        if let State::Open(cursor) = std::mem::replace(&mut self.state, State::Closed) {
            tracing::warn!(
                database = %self.driver.database(),
                "Transaction dropped while open; releasing connection"
            );
            self.driver.release(cursor);
        }
    }
}

impl<D: Driver> std::fmt::Debug for Transaction<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("database", &self.driver.database())
            .field("state", &self.state())
            .finish()
    }
}

impl<D: Driver> Cursor for Transaction<'_, D> {
    fn execute(
        &mut self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<(), Error>> + Send {
        async move {
            try_outcome!(self.begin(cx).await);
            match &mut self.state {
                State::Open(cursor) => cursor.execute(cx, sql, params).await,
                _ => Outcome::Err(Error::TransactionNotStarted),
            }
        }
    }

    fn fetchone(&mut self, cx: &Cx) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        async move {
            match &mut self.state {
                State::Open(cursor) => cursor.fetchone(cx).await,
                _ => Outcome::Err(Error::TransactionNotStarted),
            }
        }
    }

    fn fetchall(&mut self, cx: &Cx) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        async move {
            match &mut self.state {
                State::Open(cursor) => cursor.fetchall(cx).await,
                _ => Outcome::Err(Error::TransactionNotStarted),
            }
        }
    }
}
