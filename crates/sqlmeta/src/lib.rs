//! sqlmeta: typed table declarations and a composable SQL query compiler.
//!
//! Declare tables as [`Entity`] types, register them in a [`Namespace`],
//! finalize it once, then build statements and run them through any
//! [`Driver`].
//!
//! ```ignore
//! use sqlmeta::prelude::*;
//!
//! let mut ns = Namespace::new();
//! ns.register::<User>()?;
//! ns.register::<Group>()?;
//! ns.finalize();
//!
//! let admins = Select::<User>::new()
//!     .join::<UserGroup>()
//!     .filter(Col::of::<UserGroup>("group_id").eq(1))
//!     .order_by([Col::of::<User>("login")])
//!     .run(&cx, &ns, &drivers)
//!     .await;
//! ```
//!
//! # Crates
//!
//! - [`sqlmeta_core`]: declarations, schema registry, values, driver contract
//! - [`sqlmeta_query`]: statements, renderer, DDL, relation loading
//! - [`sqlmeta_session`]: transactions

pub use sqlmeta_core::*;
pub use sqlmeta_query::*;
pub use sqlmeta_session::*;

/// Everything needed to declare tables and run statements.
pub mod prelude {
    pub use sqlmeta_core::{
        Cursor, Cx, DatabaseUrl, Driver, DriverRegistry, Entity, Error, Field, Namespace,
        Outcome, Result, Row, Slots, SqlFunction, SqlType, TableDecl, Value, many_to_many,
        many_to_many_of, one_to_many, one_to_many_of, one_to_one,
    };
    pub use sqlmeta_query::{
        Chained, Col, Count, CreateSchema, CreateTable, Delete, Get, Insert, Select, Update, and,
        or, utc_now,
    };
    pub use sqlmeta_session::Transaction;
}
