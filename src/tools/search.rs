//! Text search across the character columns of a table.

use crate::db::catalog::SEARCH_ROW_LIMIT;
use crate::db::identifier::{is_safe_identifier, quote_identifier};
use crate::db::{CatalogInspector, PoolRegistry, QueryExecutor};
use crate::error::{DbError, DbResult};
use crate::models::QueryParam;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchInput {
    /// Table name (unqualified)
    pub table_name: String,
    /// Text to look for; matched case-insensitively anywhere in the value
    pub search_term: String,
    /// Target database name (see list_databases). Omit to use the default.
    #[serde(default)]
    pub database: Option<String>,
}

/// What a search will do once the text columns are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPlan {
    /// The table has nothing to search; carries the message for the caller.
    NoTextColumns(String),
    Query { sql: String, pattern: String },
}

/// Build the search statement for `table_name` over `columns`.
///
/// The table name is checked only once there is something to search, so a
/// table without text columns reports that even when its name is odd.
pub fn plan_search(table_name: &str, columns: &[String], term: &str) -> DbResult<SearchPlan> {
    if columns.is_empty() {
        return Ok(SearchPlan::NoTextColumns(format!(
            "No text columns found in table '{}' to search.",
            table_name
        )));
    }
    if !is_safe_identifier(table_name) {
        return Err(DbError::validation("Invalid table name for search"));
    }

    let filter = columns
        .iter()
        .map(|col| format!("{} ILIKE $1", quote_identifier(col)))
        .collect::<Vec<_>>()
        .join(" OR ");

    Ok(SearchPlan::Query {
        sql: format!(
            "SELECT * FROM {} WHERE {} LIMIT {}",
            quote_identifier(table_name),
            filter,
            SEARCH_ROW_LIMIT
        ),
        pattern: format!("%{}%", term),
    })
}

/// Search result: rows, or an explanation when nothing could be searched.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Message(String),
    Rows(Vec<serde_json::Map<String, JsonValue>>),
}

/// Handler for the search_in_table tool.
pub struct SearchToolHandler {
    registry: Arc<PoolRegistry>,
    executor: QueryExecutor,
}

impl SearchToolHandler {
    pub fn new(registry: Arc<PoolRegistry>) -> Self {
        Self {
            registry,
            executor: QueryExecutor::new(),
        }
    }

    pub async fn search(&self, input: SearchInput) -> DbResult<SearchOutcome> {
        let handle = self.registry.resolve(input.database.as_deref())?;
        let columns = CatalogInspector::text_columns(&handle, &input.table_name).await?;

        match plan_search(&input.table_name, &columns, &input.search_term)? {
            SearchPlan::NoTextColumns(message) => {
                info!(
                    database = %handle.name,
                    table = %input.table_name,
                    "No text columns to search"
                );
                Ok(SearchOutcome::Message(message))
            }
            SearchPlan::Query { sql, pattern } => {
                let params = [QueryParam::String(pattern)];
                let result = self.executor.execute(&handle, &sql, &params).await?;
                info!(
                    database = %handle.name,
                    table = %input.table_name,
                    columns = columns.len(),
                    rows = result.rows.len(),
                    "Searched table"
                );
                Ok(SearchOutcome::Rows(result.rows))
            }
        }
    }
}
