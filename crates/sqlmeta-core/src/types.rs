//! Semantic SQL types.
//!
//! These describe what a column stores, not how a particular dialect spells
//! it; the DDL renderer in `sqlmeta-query` owns the spelling.

use serde::{Deserialize, Serialize};

/// A semantic SQL column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// 32-bit integer.
    Integer,
    /// Boolean.
    Boolean,
    /// Variable-length string with an optional maximum length.
    String { length: Option<u32> },
    /// Unbounded text.
    Text,
    /// Timestamp, with or without time zone.
    Timestamp { with_timezone: bool },
    /// UUID.
    Uuid,
    /// Case-insensitive text.
    CaseInsensitiveText,
    /// JSON document.
    Json,
}

impl SqlType {
    /// `String` with a maximum length.
    pub const fn string(length: u32) -> Self {
        SqlType::String {
            length: Some(length),
        }
    }

    /// Timestamp with time zone, the default flavour.
    pub const fn timestamp() -> Self {
        SqlType::Timestamp {
            with_timezone: true,
        }
    }

    /// Whether values of this type can be generated by the database sequence.
    pub const fn supports_autoincrement(&self) -> bool {
        matches!(self, SqlType::Integer)
    }

    /// Short human-readable name, used in logs and summaries.
    pub const fn name(&self) -> &'static str {
        match self {
            SqlType::Integer => "integer",
            SqlType::Boolean => "boolean",
            SqlType::String { .. } => "string",
            SqlType::Text => "text",
            SqlType::Timestamp { .. } => "timestamp",
            SqlType::Uuid => "uuid",
            SqlType::CaseInsensitiveText => "citext",
            SqlType::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(SqlType::string(50), SqlType::String { length: Some(50) });
        assert_eq!(
            SqlType::timestamp(),
            SqlType::Timestamp {
                with_timezone: true
            }
        );
    }

    #[test]
    fn test_autoincrement_support() {
        assert!(SqlType::Integer.supports_autoincrement());
        assert!(!SqlType::Text.supports_autoincrement());
        assert!(!SqlType::Uuid.supports_autoincrement());
    }
}
