//! SQL identifier checks.
//!
//! Schema and table names that end up spliced into statement text must pass
//! [`is_safe_identifier`] first. Quoting alone is not relied on.

/// True when `name` is non-empty and only contains `[A-Za-z0-9_]`.
pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_identifiers() {
        for name in ["users", "public", "Order_Items", "t1", "_", "2024_sales"] {
            assert!(is_safe_identifier(name), "{name}");
        }
    }

    #[test]
    fn test_unsafe_identifiers() {
        for name in [
            "",
            "users;",
            "a\"b",
            "a'b",
            "my table",
            "schema.table",
            "drop--",
            "café",
            "tab\tle",
        ] {
            assert!(!is_safe_identifier(name), "{name}");
        }
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("first name"), "\"first name\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
