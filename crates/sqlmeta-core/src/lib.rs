//! Core types and contracts for sqlmeta.
//!
//! `sqlmeta-core` is the **foundation layer** of the workspace. It owns the
//! table metadata every other crate reads and the driver contract every
//! other crate executes through.
//!
//! # Role In The Architecture
//!
//! - **Declarations**: [`Field`] constructors, relation declarations and the
//!   [`Entity`] trait describe how a Rust type maps onto a table.
//! - **Schema registry**: [`Namespace`] holds registered tables per database,
//!   resolves forward references in a second pass and orders tables by
//!   foreign-key dependency.
//! - **Data model**: [`Value`], [`Row`] and [`SqlType`] are shared by the
//!   query compiler, the DDL renderer and drivers.
//! - **Driver contract**: [`Driver`] and [`Cursor`] are implemented by
//!   external drivers; [`DriverRegistry`] binds them to names.
//! - **Structured concurrency**: re-exports `Cx` and `Outcome` from
//!   asupersync so every database operation is cancel-correct.
//!
//! # Who Uses This Crate
//!
//! - `sqlmeta-query` renders statements from [`TableDef`] metadata and runs
//!   them through a [`Cursor`].
//! - `sqlmeta-session` frames statements in a transaction over a [`Driver`].
//! - The `sqlmeta` facade re-exports everything for applications.

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod connection;
pub mod drivers;
pub mod entity;
pub mod error;
pub mod field;
pub mod identifiers;
pub mod registry;
pub mod relationship;
pub mod row;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;
pub mod url;
pub mod value;

pub use connection::{Cursor, Driver, ScopedCursor};
pub use drivers::DriverRegistry;
pub use entity::{Entity, Slots, TableDecl};
pub use error::{Error, Result};
pub use field::{
    DefaultValue, Field, FieldKind, FieldValue, Reference, ResolvedRef, SqlFunction, TableTarget,
    Target,
};
pub use identifiers::{quote_ident, snake_case, table_name_for};
pub use registry::{ColumnSummary, Finalized, KeyExtractor, Namespace, TableDef, TableSummary};
pub use relationship::{
    Relation, RelationKind, TableLink, many_to_many, many_to_many_of, one_to_many,
    one_to_many_of, one_to_one,
};
pub use row::Row;
pub use types::SqlType;
pub use url::DatabaseUrl;
pub use value::Value;

/// Unwrap an `Outcome::Ok`, returning any other variant from the enclosing
/// async function. Use [`try_result!`] for plain `Result`s.
#[macro_export]
macro_rules! try_outcome {
    ($expr:expr) => {
        match $expr {
            $crate::Outcome::Ok(value) => value,
            $crate::Outcome::Err(e) => return $crate::Outcome::Err(e),
            $crate::Outcome::Cancelled(r) => return $crate::Outcome::Cancelled(r),
            $crate::Outcome::Panicked(p) => return $crate::Outcome::Panicked(p),
        }
    };
}

/// Unwrap a `Result` inside a function returning `Outcome`.
#[macro_export]
macro_rules! try_result {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => return $crate::Outcome::Err(e.into()),
        }
    };
}
