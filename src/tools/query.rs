//! Ad-hoc query tools.
//!
//! `run_read_only_query` only lets through statements that classify as
//! read-only; `run_modification_query` runs anything.

use crate::db::{PoolRegistry, QueryExecutor};
use crate::error::DbResult;
use crate::models::{ModificationSummary, QueryParam};
use crate::tools::safety::ensure_read_only;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

/// Input for run_read_only_query and run_modification_query.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL statement to execute
    pub sql_query: String,
    /// Positional parameters bound to $1, $2, ...
    #[serde(default)]
    pub params: Vec<QueryParam>,
    /// Target database name (see list_databases). Omit to use the default.
    #[serde(default)]
    pub database: Option<String>,
}

/// Handler for the query tools.
pub struct QueryToolHandler {
    registry: Arc<PoolRegistry>,
    executor: QueryExecutor,
}

impl QueryToolHandler {
    pub fn new(registry: Arc<PoolRegistry>) -> Self {
        Self {
            registry,
            executor: QueryExecutor::new(),
        }
    }

    /// Run a read-only statement and return its rows.
    ///
    /// Classification happens before the target is resolved, so rejected text
    /// never reaches a database.
    pub async fn run_read_only(
        &self,
        input: QueryInput,
    ) -> DbResult<Vec<serde_json::Map<String, JsonValue>>> {
        ensure_read_only(&input.sql_query)?;

        let handle = self.registry.resolve(input.database.as_deref())?;
        let result = self
            .executor
            .execute(&handle, &input.sql_query, &input.params)
            .await?;

        info!(
            database = %handle.name,
            rows = result.rows.len(),
            elapsed_ms = result.execution_time_ms,
            "Read-only query completed"
        );
        Ok(result.rows)
    }

    /// Run any statement and report what it did.
    pub async fn run_modification(&self, input: QueryInput) -> DbResult<ModificationSummary> {
        let handle = self.registry.resolve(input.database.as_deref())?;
        let result = self
            .executor
            .execute(&handle, &input.sql_query, &input.params)
            .await?;

        info!(
            database = %handle.name,
            command = %result.command_tag,
            row_count = result.row_count,
            elapsed_ms = result.execution_time_ms,
            "Modification query completed"
        );
        Ok(result.into())
    }
}
