//! Driver and cursor contracts.
//!
//! The wire protocol lives outside this workspace. A driver crate implements
//! [`Driver`] and [`Cursor`]; everything above it (statements, transactions,
//! schema creation) is written against these traits only.
//!
//! All I/O takes a `&Cx` and returns an [`Outcome`], so cancellation and
//! panics propagate the same way as errors.

use std::future::Future;

use asupersync::{Cx, Outcome};

use crate::error::Error;
use crate::row::Row;
use crate::url::DatabaseUrl;
use crate::value::Value;

/// A cursor executes one statement at a time and buffers its result rows.
pub trait Cursor: Send {
    /// Execute a statement with positional parameters.
    fn execute(
        &mut self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Next row of the last result, or `None` when exhausted.
    fn fetchone(&mut self, cx: &Cx) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send;

    /// All remaining rows of the last result, possibly empty.
    fn fetchall(&mut self, cx: &Cx) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send;
}

/// A connected database driver.
pub trait Driver: Send + Sync + Sized + 'static {
    /// Cursor type handed out by [`Driver::acquire`].
    type Cursor: Cursor;

    /// URL schemes this driver accepts.
    const SCHEMES: &'static [&'static str];

    /// Port used when the URL does not name one.
    const DEFAULT_PORT: u16;

    /// Open a connection (or pool) for `url`.
    fn connect(cx: &Cx, url: &DatabaseUrl) -> impl Future<Output = Outcome<Self, Error>> + Send;

    /// Name of the connected database.
    fn database(&self) -> &str;

    /// Close the connection.
    fn disconnect(&self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Take a cursor out of the driver. Must be handed back with
    /// [`Driver::release`].
    fn acquire(&self, cx: &Cx) -> impl Future<Output = Outcome<Self::Cursor, Error>> + Send;

    /// Give a cursor back. Must not fail; may run from `Drop`.
    fn release(&self, cursor: Self::Cursor);

    /// Acquire a cursor that is released when the guard drops.
    fn cursor(&self, cx: &Cx) -> impl Future<Output = Outcome<ScopedCursor<'_, Self>, Error>> + Send {
        async move {
            match self.acquire(cx).await {
                Outcome::Ok(cursor) => Outcome::Ok(ScopedCursor::new(self, cursor)),
                Outcome::Err(e) => Outcome::Err(e),
                Outcome::Cancelled(r) => Outcome::Cancelled(r),
                Outcome::Panicked(p) => Outcome::Panicked(p),
            }
        }
    }
}

/// A cursor borrowed from a driver, released on drop.
///
/// Dropping the guard while a fetch is suspended still hands the cursor
/// back, so abandoned queries do not leak connections.
pub struct ScopedCursor<'d, D: Driver> {
    driver: &'d D,
    cursor: Option<D::Cursor>,
}

impl<'d, D: Driver> ScopedCursor<'d, D> {
    pub fn new(driver: &'d D, cursor: D::Cursor) -> Self {
        Self {
            driver,
            cursor: Some(cursor),
        }
    }

    /// Take the cursor out without releasing it. The caller becomes
    /// responsible for handing it back.
    pub fn detach(mut self) -> Option<D::Cursor> {
        self.cursor.take()
    }

    /// Release now instead of at end of scope.
    pub fn release(mut self) {
        if let Some(cursor) = self.cursor.take() {
            self.driver.release(cursor);
        }
    }
}

impl<D: Driver> Drop for ScopedCursor<'_, D> {
    fn drop(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            self.driver.release(cursor);
        }
    }
}

impl<D: Driver> std::fmt::Debug for ScopedCursor<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedCursor")
            .field("database", &self.driver.database())
            .field("held", &self.cursor.is_some())
            .finish()
    }
}

fn released() -> Error {
    Error::driver("cursor already released")
}

impl<D: Driver> Cursor for ScopedCursor<'_, D> {
    fn execute(
        &mut self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<(), Error>> + Send {
        async move {
            match self.cursor.as_mut() {
                Some(cursor) => cursor.execute(cx, sql, params).await,
                None => Outcome::Err(released()),
            }
        }
    }

    fn fetchone(&mut self, cx: &Cx) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        async move {
            match self.cursor.as_mut() {
                Some(cursor) => cursor.fetchone(cx).await,
                None => Outcome::Err(released()),
            }
        }
    }

    fn fetchall(&mut self, cx: &Cx) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        async move {
            match self.cursor.as_mut() {
                Some(cursor) => cursor.fetchall(cx).await,
                None => Outcome::Err(released()),
            }
        }
    }
}
