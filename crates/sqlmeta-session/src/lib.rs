//! Transaction framing for sqlmeta.
//!
//! [`Transaction`] wraps one driver connection in `BEGIN` ... `COMMIT` /
//! `ROLLBACK`. Because it implements [`Cursor`](sqlmeta_core::Cursor), every
//! statement from `sqlmeta-query` runs inside it through `run_on`:
//!
//! ```ignore
//! let mut tx = Transaction::from_registry(&drivers, "sample")?;
//! Insert::new(&mut user).run_on(&cx, &ns, &mut tx).await?;
//! tx.commit(&cx).await?;
//! ```
//!
//! The connection goes back to the driver on commit, on rollback (whether
//! or not the verb succeeded) and when the transaction is dropped open.

pub mod transaction;

pub use transaction::{Transaction, TransactionState};
