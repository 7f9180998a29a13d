//! Statement chain and SQL rendering for sqlmeta.
//!
//! `sqlmeta-query` turns table metadata from the schema registry into SQL.
//!
//! # Role In The Architecture
//!
//! - **Expressions**: [`Col`] builds comparison and `IN` predicates, grouped
//!   with [`and`] / [`or`]; [`utc_now`] is a deferred SQL function.
//! - **Statements**: [`Get`], [`Select`], [`Count`], [`Insert`], [`Update`]
//!   and [`Delete`] carry a [`Chain`] of modifiers attached through
//!   [`Chained`].
//! - **Rendering**: [`Renderer`] emits quoted identifiers and `%s`
//!   placeholders for the reference dialect; [`PostgresDdlGenerator`] emits
//!   `CREATE TABLE`.
//! - **Relations**: [`related`] builds the follow-up query for a declared
//!   relation; [`load_one`] / [`load_many`] run it.
//!
//! Every statement renders with `build(&Namespace)` and executes either on
//! an explicit cursor (`run_on`) or on a scoped cursor from the driver
//! registered under the table's database (`run`).

pub mod builder;
pub mod dialect;
pub mod expr;
pub mod relation;
pub mod schema;
pub mod select;
pub mod statement;

pub use builder::{Delete, Insert, Update};
pub use dialect::Renderer;
pub use expr::{CmpOp, Col, Expr, Operand, Order, and, or, utc_now};
pub use relation::{load_many, load_many_on, load_one, load_one_on, related};
pub use schema::{CreateSchema, CreateTable, DdlGenerator, PostgresDdlGenerator};
pub use select::{Count, Get, ResultSet, Select};
pub use statement::{Chain, Chained, Join, Modifier, ModifierKind};
