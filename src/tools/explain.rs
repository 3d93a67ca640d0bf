//! Query execution plan tool.

use crate::db::{PoolRegistry, QueryExecutor};
use crate::error::{DbError, DbResult};
use crate::tools::query::QueryInput;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

/// Column holding the plan in `EXPLAIN (FORMAT JSON)` output.
const PLAN_COLUMN: &str = "QUERY PLAN";

/// Wrap a statement in PostgreSQL's JSON plan form.
pub fn explain_sql(sql: &str) -> String {
    format!("EXPLAIN (FORMAT JSON) {}", sql)
}

/// Handler for the explain_query tool.
pub struct ExplainToolHandler {
    registry: Arc<PoolRegistry>,
    executor: QueryExecutor,
}

impl ExplainToolHandler {
    pub fn new(registry: Arc<PoolRegistry>) -> Self {
        Self {
            registry,
            executor: QueryExecutor::new(),
        }
    }

    /// Return the structured plan of the statement without running it.
    ///
    /// `EXPLAIN ANALYZE` written by the caller inside `sql_query` is not
    /// prevented and will execute the statement.
    pub async fn explain(&self, input: QueryInput) -> DbResult<JsonValue> {
        let sql = input.sql_query.trim();
        if sql.is_empty() {
            return Err(DbError::validation("SQL statement is required"));
        }

        let handle = self.registry.resolve(input.database.as_deref())?;
        let result = self
            .executor
            .execute(&handle, &explain_sql(sql), &input.params)
            .await?;

        let plan = result
            .rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove(PLAN_COLUMN))
            .ok_or_else(|| DbError::internal("EXPLAIN returned no plan"))?;

        info!(
            database = %handle.name,
            elapsed_ms = result.execution_time_ms,
            "Explained query"
        );
        Ok(plan)
    }
}
