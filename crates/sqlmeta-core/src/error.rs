//! Error types for sqlmeta.
//!
//! Every variant is a programmer or configuration error surfaced immediately;
//! nothing here is retried. Failures coming from a database driver are wrapped
//! in [`Error::Driver`] and propagated unchanged.

use std::fmt;

/// Convenient result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type for all sqlmeta operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A table with the same name is already registered for this database.
    DuplicateTable { database: String, table: String },
    /// A `"table.column"` (or typed) reference could not be resolved.
    UnresolvedReference { owner: String, reference: String },
    /// A second, different value was written to an immutable field.
    ImmutableField { table: String, field: String },
    /// The operation is not allowed on this field or statement.
    UnsupportedOperation(String),
    /// A statement modifier name does not map to a known modifier.
    UnsupportedStatement { name: String },
    /// Primary-key lookup arguments cannot be interpreted unambiguously.
    AmbiguousKey { table: String, reason: String },
    /// A primary-key value is required but was not supplied.
    MissingKeyValue { table: String, column: String },
    /// `commit`/`rollback`/fetch was called on a transaction that is not open.
    TransactionNotStarted,
    /// No driver is registered under this name.
    DriverNotRegistered { name: String },
    /// The URL scheme is not accepted by the driver.
    InvalidScheme { scheme: String },
    /// The URL could not be parsed.
    InvalidUrl { url: String, reason: String },
    /// No table registered under this database/name or entity type.
    UnknownTable { table: String },
    /// No field with this attribute (or column) name on the table.
    UnknownField { table: String, field: String },
    /// Foreign keys form a cycle; tables cannot be ordered.
    CyclicReference { tables: Vec<String> },
    /// A join condition was requested to be inferred but none exists.
    NoJoinCondition { from: String, to: String },
    /// A row could not be mapped onto an entity.
    Hydration { table: String, reason: String },
    /// A write statement expected the post-write row but none came back.
    NoRowReturned { table: String },
    /// Failure reported by the external driver.
    Driver(String),
}

impl Error {
    /// Build a driver error from any displayable failure.
    pub fn driver(err: impl fmt::Display) -> Self {
        Error::Driver(err.to_string())
    }

    /// Whether this error originates from the external driver.
    pub fn is_driver(&self) -> bool {
        matches!(self, Error::Driver(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateTable { database, table } => {
                write!(f, "table {table:?} is already registered in database {database:?}")
            }
            Error::UnresolvedReference { owner, reference } => {
                write!(f, "{owner}: unresolved reference to {reference:?}")
            }
            Error::ImmutableField { table, field } => {
                write!(f, "cannot update a field declared immutable ({table}.{field})")
            }
            Error::UnsupportedOperation(msg) => write!(f, "unsupported operation: {msg}"),
            Error::UnsupportedStatement { name } => {
                write!(f, "no statement modifier registered for {name:?}")
            }
            Error::AmbiguousKey { table, reason } => {
                write!(f, "ambiguous primary key lookup on {table}: {reason}")
            }
            Error::MissingKeyValue { table, column } => {
                write!(f, "missing primary key value {table}.{column}")
            }
            Error::TransactionNotStarted => write!(f, "transaction not begun"),
            Error::DriverNotRegistered { name } => {
                write!(f, "no driver registered for database {name:?}")
            }
            Error::InvalidScheme { scheme } => write!(f, "invalid url scheme {scheme:?}"),
            Error::InvalidUrl { url, reason } => write!(f, "invalid database url {url:?}: {reason}"),
            Error::UnknownTable { table } => write!(f, "unknown table {table}"),
            Error::UnknownField { table, field } => write!(f, "unknown field {table}.{field}"),
            Error::CyclicReference { tables } => {
                write!(f, "cyclic foreign key references: {}", tables.join(" -> "))
            }
            Error::NoJoinCondition { from, to } => {
                write!(f, "cannot infer a join condition from {from} to {to}")
            }
            Error::Hydration { table, reason } => {
                write!(f, "cannot map row onto {table}: {reason}")
            }
            Error::NoRowReturned { table } => {
                write!(f, "statement on {table} returned no row")
            }
            Error::Driver(msg) => write!(f, "driver error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_immutable_field() {
        let err = Error::ImmutableField {
            table: "user".to_string(),
            field: "id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot update a field declared immutable (user.id)"
        );
    }

    #[test]
    fn test_display_cycle_lists_path() {
        let err = Error::CyclicReference {
            tables: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic foreign key references: a -> b -> a");
    }

    #[test]
    fn test_driver_helper() {
        let err = Error::driver("connection reset");
        assert!(err.is_driver());
        assert!(!Error::TransactionNotStarted.is_driver());
    }
}
