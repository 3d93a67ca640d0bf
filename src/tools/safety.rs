//! Read-only classification of ad-hoc SQL.
//!
//! This is a keyword prefix check on the trimmed, uppercased text. It does not
//! parse SQL. Known gaps that callers rely on staying as they are:
//!
//! - `WITH x AS (DELETE ... RETURNING *) SELECT ...` is classified read-only.
//! - `SELECT nextval('s')` or a volatile function call is read-only here.
//! - Keywords only need to be a prefix, so `SELECTX` matches `SELECT`.
//! - Leading comments make a read classify as mutating.

use crate::error::{DbError, DbResult};

const READ_ONLY_PREFIXES: &[&str] = &["SELECT", "WITH", "EXPLAIN", "VALUES"];

pub const NOT_READ_ONLY_MESSAGE: &str =
    "Query is not read-only. Use run_modification_query for this operation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    ReadOnly,
    Mutating,
}

pub fn classify(sql: &str) -> QueryKind {
    let normalized = sql.trim().to_uppercase();
    if READ_ONLY_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
    {
        QueryKind::ReadOnly
    } else {
        QueryKind::Mutating
    }
}

/// Fail with a validation error unless `sql` classifies as read-only.
pub fn ensure_read_only(sql: &str) -> DbResult<()> {
    match classify(sql) {
        QueryKind::ReadOnly => Ok(()),
        QueryKind::Mutating => Err(DbError::validation(NOT_READ_ONLY_MESSAGE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_prefixes() {
        for sql in [
            "  select 1",
            "SELECT * FROM users",
            "\n\twith t as (select 1) select * from t",
            "explain select 1",
            "VALUES (1), (2)",
        ] {
            assert_eq!(classify(sql), QueryKind::ReadOnly, "{sql}");
        }
    }

    #[test]
    fn test_mutating_statements() {
        for sql in [
            "UPDATE t SET x=1",
            "insert into t values (1)",
            "DELETE FROM t",
            "DROP TABLE t",
            "CREATE TABLE t (id int)",
            "",
            "   ",
            "(SELECT 1)",
            "-- comment\nSELECT 1",
        ] {
            assert_eq!(classify(sql), QueryKind::Mutating, "{sql:?}");
        }
    }

    #[test]
    fn test_heuristic_limits_are_preserved() {
        assert_eq!(
            classify("WITH d AS (DELETE FROM t RETURNING *) SELECT * FROM d"),
            QueryKind::ReadOnly
        );
        assert_eq!(classify("SELECTX"), QueryKind::ReadOnly);
    }

    #[test]
    fn test_ensure_read_only_message() {
        assert!(ensure_read_only("select 1").is_ok());
        let err = ensure_read_only("UPDATE t SET x=1").unwrap_err();
        assert!(matches!(err, DbError::Validation { .. }));
        assert_eq!(err.to_string(), NOT_READ_ONLY_MESSAGE);
    }
}
