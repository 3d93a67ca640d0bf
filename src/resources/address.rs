//! Resource address parsing.
//!
//! Two shapes are accepted:
//!
//! ```text
//! postgres://{database}/{schema}/{table}   host is a registered database name
//! postgres://{schema}/{table}              single-database shape, default database
//! ```
//!
//! A host that matches a registered database always wins over the
//! single-database reading. Without a host (`postgres:///a/b/c` or
//! `postgres:a/b`) the path segments are read positionally.

use crate::db::identifier::is_safe_identifier;
use crate::error::{DbError, DbResult};
use url::Url;

pub const RESOURCE_SCHEME: &str = "postgres";

/// A validated (database, schema, table) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAddress {
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl ResourceAddress {
    /// Canonical database-qualified address.
    pub fn uri(&self) -> String {
        format!(
            "{}://{}/{}/{}",
            RESOURCE_SCHEME, self.database, self.schema, self.table
        )
    }
}

/// Parse `uri` against the registered database names.
///
/// Schema and table are checked against `^[A-Za-z0-9_]+$` before the address
/// is returned, so callers may splice them into statement text.
pub fn parse(
    uri: &str,
    known_databases: &[String],
    default_database: Option<&str>,
) -> DbResult<ResourceAddress> {
    let url = Url::parse(uri).map_err(|e| DbError::address(format!("{uri}: {e}")))?;
    if url.scheme() != RESOURCE_SCHEME {
        return Err(DbError::address(format!(
            "unsupported scheme '{}', expected {}://",
            url.scheme(),
            RESOURCE_SCHEME
        )));
    }

    let is_known = |name: &str| known_databases.iter().any(|k| k == name);
    let host = url.host_str().filter(|h| !h.is_empty());
    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();

    let (database, schema, table) = match host {
        Some(host) if is_known(host) => {
            if segments.len() < 2 {
                return Err(DbError::address(format!(
                    "expected {RESOURCE_SCHEME}://{host}/schema/table"
                )));
            }
            (Some(host), segments[0], segments[1])
        }
        Some(host) => (
            default_database,
            host,
            segments.first().copied().unwrap_or_default(),
        ),
        None if segments.len() >= 3 && is_known(segments[0]) => {
            (Some(segments[0]), segments[1], segments[2])
        }
        None => (
            default_database,
            segments.first().copied().unwrap_or_default(),
            segments.get(1).copied().unwrap_or_default(),
        ),
    };

    let Some(database) = database else {
        return Err(DbError::address(format!(
            "no database in '{uri}' and no default database; use {RESOURCE_SCHEME}://database/schema/table"
        )));
    };
    if schema.is_empty() || table.is_empty() {
        return Err(DbError::address(format!(
            "expected {RESOURCE_SCHEME}://[database/]schema/table, got '{uri}'"
        )));
    }
    if !is_safe_identifier(schema) || !is_safe_identifier(table) {
        return Err(DbError::address("Invalid schema or table name in URI"));
    }

    Ok(ResourceAddress {
        database: database.to_string(),
        schema: schema.to_string(),
        table: table.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec!["analytics".to_string(), "main".to_string()]
    }

    fn triple(addr: &ResourceAddress) -> (&str, &str, &str) {
        (&addr.database, &addr.schema, &addr.table)
    }

    #[test]
    fn test_known_host_is_database() {
        let addr = parse("postgres://analytics/public/users", &known(), Some("main")).unwrap();
        assert_eq!(triple(&addr), ("analytics", "public", "users"));
    }

    #[test]
    fn test_unknown_host_is_schema() {
        let addr = parse("postgres://public/users", &known(), Some("main")).unwrap();
        assert_eq!(triple(&addr), ("main", "public", "users"));
    }

    #[test]
    fn test_known_host_requires_two_segments() {
        let err = parse("postgres://analytics/users", &known(), Some("main")).unwrap_err();
        assert!(matches!(err, DbError::Address { .. }));
    }

    #[test]
    fn test_database_named_like_schema_wins() {
        // A database literally called "public" shadows the schema reading.
        let names = vec!["public".to_string()];
        let addr = parse("postgres://public/sales/orders", &names, Some("main")).unwrap();
        assert_eq!(triple(&addr), ("public", "sales", "orders"));
    }

    #[test]
    fn test_no_host_positional_with_database() {
        let addr = parse("postgres:///analytics/public/users", &known(), None).unwrap();
        assert_eq!(triple(&addr), ("analytics", "public", "users"));
    }

    #[test]
    fn test_no_host_positional_without_known_first_segment() {
        let addr = parse("postgres:///public/users/extra", &known(), Some("main")).unwrap();
        assert_eq!(triple(&addr), ("main", "public", "users"));
    }

    #[test]
    fn test_no_host_two_segments() {
        let addr = parse("postgres:public/users", &known(), Some("main")).unwrap();
        assert_eq!(triple(&addr), ("main", "public", "users"));
    }

    #[test]
    fn test_no_host_single_segment_is_rejected() {
        let err = parse("postgres:///users", &known(), Some("main")).unwrap_err();
        assert!(matches!(err, DbError::Address { .. }));
    }

    #[test]
    fn test_missing_default_database() {
        let err = parse("postgres://public/users", &known(), None).unwrap_err();
        assert!(err.to_string().contains("no default database"));
    }

    #[test]
    fn test_missing_table() {
        assert!(parse("postgres://public", &known(), Some("main")).is_err());
        assert!(parse("postgres://public/", &known(), Some("main")).is_err());
    }

    #[test]
    fn test_wrong_scheme() {
        let err = parse("mysql://public/users", &known(), Some("main")).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
        assert!(parse("not a uri", &known(), Some("main")).is_err());
    }

    #[test]
    fn test_injection_characters_rejected() {
        for uri in [
            "postgres://public/users;drop",
            "postgres://pub;lic/users",
            "postgres://public/us'ers",
            "postgres://public/us%22ers",
            "postgres://analytics/public/users%3B",
            "postgres://analytics/pub%20lic/users",
        ] {
            let err = parse(uri, &known(), Some("main")).unwrap_err();
            assert!(matches!(err, DbError::Address { .. }), "{uri}");
        }
    }

    #[test]
    fn test_host_case_preserved() {
        let addr = parse("postgres://Sales/Orders", &known(), Some("main")).unwrap();
        assert_eq!(triple(&addr), ("main", "Sales", "Orders"));
    }

    #[test]
    fn test_uri_round_trip() {
        let addr = parse("postgres://public/users", &known(), Some("main")).unwrap();
        assert_eq!(addr.uri(), "postgres://main/public/users");
        assert_eq!(parse(&addr.uri(), &known(), None).unwrap(), addr);
    }
}
