//! Scripted in-memory driver for tests.
//!
//! [`MemoryDriver`] never talks to a database. It records every executed
//! statement with its parameters, answers row-returning statements from a
//! queue of canned results, and counts cursor acquire/release so tests can
//! assert that nothing leaks.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use asupersync::{Cx, Outcome};

use crate::connection::{Cursor, Driver};
use crate::error::Error;
use crate::row::Row;
use crate::url::DatabaseUrl;
use crate::value::Value;

#[derive(Debug, Default)]
struct MemoryState {
    executed: Vec<(String, Vec<Value>)>,
    results: VecDeque<Vec<Row>>,
    fail_on: Option<String>,
    stall_on: Option<String>,
    acquired: usize,
    released: usize,
    connected: bool,
}

/// In-memory driver sharing its state across clones.
#[derive(Debug, Clone)]
pub struct MemoryDriver {
    database: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDriver {
    pub fn new(database: impl Into<String>) -> Self {
        let state = MemoryState {
            connected: true,
            ..MemoryState::default()
        };
        Self {
            database: database.into(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the result of the next row-returning statement.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state().results.push_back(rows);
    }

    /// Fail every statement containing `pattern`.
    pub fn fail_on(&self, pattern: impl Into<String>) {
        self.state().fail_on = Some(pattern.into());
    }

    /// Never complete statements containing `pattern`.
    pub fn stall_on(&self, pattern: impl Into<String>) {
        self.state().stall_on = Some(pattern.into());
    }

    /// Every executed `(sql, params)` pair, oldest first.
    pub fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.state().executed.clone()
    }

    /// Executed SQL text only.
    pub fn statements(&self) -> Vec<String> {
        self.state()
            .executed
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    pub fn acquired(&self) -> usize {
        self.state().acquired
    }

    pub fn released(&self) -> usize {
        self.state().released
    }

    /// Cursors acquired and not yet released.
    pub fn outstanding(&self) -> usize {
        let state = self.state();
        state.acquired - state.released
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }
}

fn returns_rows(sql: &str) -> bool {
    let sql = sql.trim_start();
    sql.starts_with("SELECT") || sql.contains(" RETURNING ")
}

/// Cursor handed out by [`MemoryDriver`].
#[derive(Debug)]
pub struct MemoryCursor {
    state: Arc<Mutex<MemoryState>>,
    pending: VecDeque<Row>,
}

impl MemoryCursor {
    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Cursor for MemoryCursor {
    fn execute(
        &mut self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<(), Error>> + Send {
        let (outcome, stalled) = {
            let mut state = self.state();
            state.executed.push((sql.to_string(), params.to_vec()));
            let stalled = state
                .stall_on
                .as_deref()
                .is_some_and(|pattern| sql.contains(pattern));
            let failing = state
                .fail_on
                .as_deref()
                .is_some_and(|pattern| sql.contains(pattern));
            let outcome = if failing {
                Err(Error::driver(format!("scripted failure: {sql}")))
            } else if returns_rows(sql) {
                Ok(state.results.pop_front().unwrap_or_default())
            } else {
                Ok(Vec::new())
            };
            (outcome, stalled)
        };
        let result = match outcome {
            Ok(rows) => {
                self.pending = rows.into();
                Outcome::Ok(())
            }
            Err(e) => Outcome::Err(e),
        };
        async move {
            if stalled {
                std::future::pending::<()>().await;
            }
            result
        }
    }

    fn fetchone(&mut self, _cx: &Cx) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        let row = self.pending.pop_front();
        async move { Outcome::Ok(row) }
    }

    fn fetchall(&mut self, _cx: &Cx) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        let rows: Vec<Row> = self.pending.drain(..).collect();
        async move { Outcome::Ok(rows) }
    }
}

impl Driver for MemoryDriver {
    type Cursor = MemoryCursor;

    const SCHEMES: &'static [&'static str] = &["memory"];
    const DEFAULT_PORT: u16 = 5432;

    fn connect(_cx: &Cx, url: &DatabaseUrl) -> impl Future<Output = Outcome<Self, Error>> + Send {
        let driver = Self::new(url.database.clone());
        async move { Outcome::Ok(driver) }
    }

    fn database(&self) -> &str {
        &self.database
    }

    fn disconnect(&self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        self.state().connected = false;
        async { Outcome::Ok(()) }
    }

    fn acquire(&self, _cx: &Cx) -> impl Future<Output = Outcome<MemoryCursor, Error>> + Send {
        self.state().acquired += 1;
        let cursor = MemoryCursor {
            state: Arc::clone(&self.state),
            pending: VecDeque::new(),
        };
        async move { Outcome::Ok(cursor) }
    }

    fn release(&self, _cursor: MemoryCursor) {
        self.state().released += 1;
    }
}
