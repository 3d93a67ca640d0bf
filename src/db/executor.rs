//! Statement execution against a resolved pool.
//!
//! Each call checks out exactly one connection and holds it in a
//! `PoolConnection`, which goes back to the pool when dropped. Every exit path,
//! including `?` on a failed statement, therefore releases it.
//!
//! No timeout is applied here: acquisition waits according to the pool's own
//! acquire timeout, and a running statement holds its connection until the
//! server answers.

use crate::db::params::bind_all;
use crate::db::registry::ConnectionHandle;
use crate::db::types::RowToJson;
use crate::error::DbResult;
use crate::models::{QueryParam, QueryResult};
use futures_util::TryStreamExt;
use sqlx::postgres::PgRow;
use sqlx::{Either, Executor};
use std::time::Instant;
use tracing::debug;

/// Query executor that handles statement execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor;

impl QueryExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute a statement and normalize what the server reports.
    ///
    /// Without parameters the text is sent over the simple query protocol, so
    /// utility statements that cannot be prepared still work.
    pub async fn execute(
        &self,
        handle: &ConnectionHandle,
        sql: &str,
        params: &[QueryParam],
    ) -> DbResult<QueryResult> {
        let start = Instant::now();

        debug!(
            database = %handle.name,
            sql = %sql,
            params = params.len(),
            "Executing statement"
        );

        let mut conn = handle.pool.acquire().await?;

        let mut rows: Vec<PgRow> = Vec::new();
        let mut rows_affected: u64 = 0;
        {
            let mut stream = if params.is_empty() {
                (&mut *conn).fetch_many(sql)
            } else {
                (&mut *conn).fetch_many(bind_all(sql, params))
            };
            while let Some(step) = stream.try_next().await? {
                match step {
                    Either::Left(done) => rows_affected += done.rows_affected(),
                    Either::Right(row) => rows.push(row),
                }
            }
        }
        drop(conn);

        let execution_time_ms = start.elapsed().as_millis() as u64;
        let columns = rows.first().map(RowToJson::column_names).unwrap_or_default();
        let json_rows: Vec<_> = rows.iter().map(RowToJson::to_json_map).collect();
        let row_count = if rows_affected > 0 {
            rows_affected
        } else {
            json_rows.len() as u64
        };

        debug!(
            database = %handle.name,
            rows = json_rows.len(),
            rows_affected,
            elapsed_ms = execution_time_ms,
            "Statement finished"
        );

        Ok(QueryResult {
            columns,
            rows: json_rows,
            row_count,
            command_tag: command_tag(sql),
            execution_time_ms,
        })
    }
}

/// Leading keyword of the statement, uppercased.
///
/// The driver does not expose the server's command tag, so this is derived
/// from the text: `"  insert into t ..."` gives `"INSERT"`. A data-modifying
/// CTE reports `"WITH"`, not the command inside it.
pub fn command_tag(sql: &str) -> String {
    sql.trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_tag() {
        assert_eq!(command_tag("  insert into t values (1)"), "INSERT");
        assert_eq!(command_tag("UPDATE t SET x=1"), "UPDATE");
        assert_eq!(command_tag("delete\nfrom t"), "DELETE");
        assert_eq!(command_tag("SELECT(1)"), "SELECT");
        assert_eq!(command_tag(""), "");
        assert_eq!(command_tag("(select 1)"), "");
        assert_eq!(
            command_tag("WITH m AS (INSERT INTO t VALUES (1) RETURNING *) SELECT * FROM m"),
            "WITH"
        );
    }
}
