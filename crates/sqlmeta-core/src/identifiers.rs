//! SQL identifier helpers.

use std::sync::LazyLock;

use regex::Regex;

static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid regex"));
static LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

/// Quote an identifier with double quotes, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Convert a CamelCase name to snake_case.
pub fn snake_case(name: &str) -> String {
    let step = WORD_BOUNDARY.replace_all(name, "${1}_${2}");
    LOWER_UPPER.replace_all(&step, "${1}_${2}").to_lowercase()
}

/// Default table name for a Rust type name such as `app::models::UserGroup`.
pub fn table_name_for(type_name: &str) -> String {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    let last = without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics);
    snake_case(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("user"), "\"user\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("UserGroup"), "user_group");
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("HTTPRequest"), "http_request");
        assert_eq!(snake_case("Table2Name"), "table2_name");
    }

    #[test]
    fn test_table_name_for_strips_path() {
        assert_eq!(table_name_for("app::models::UserPreference"), "user_preference");
        assert_eq!(table_name_for("Wrapper<app::Inner>"), "wrapper");
    }
}
