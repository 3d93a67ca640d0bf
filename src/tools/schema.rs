//! Schema introspection tools.
//!
//! Implements list_databases, list_tables, describe_table, list_indexes and
//! list_constraints.

use crate::db::{CatalogInspector, DatabaseSummary, PoolRegistry, RegistrationFailure};
use crate::error::DbResult;
use crate::models::{ColumnEntry, ConstraintEntry, IndexEntry, TableEntry};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for tools that only take a database selector.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DatabaseInput {
    /// Target database name (see list_databases). Omit to use the default.
    #[serde(default)]
    pub database: Option<String>,
}

/// Input for per-table tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableInput {
    /// Table name (unqualified)
    pub table_name: String,
    /// Target database name (see list_databases). Omit to use the default.
    #[serde(default)]
    pub database: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListDatabasesOutput {
    pub databases: Vec<DatabaseSummary>,
    /// Name used when the `database` argument is omitted; absent when ambiguous
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Configured databases that could not be opened at startup
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<RegistrationFailure>,
}

/// Handler for schema tools.
pub struct SchemaToolHandler {
    registry: Arc<PoolRegistry>,
}

impl SchemaToolHandler {
    pub fn new(registry: Arc<PoolRegistry>) -> Self {
        Self { registry }
    }

    pub fn list_databases(&self) -> ListDatabasesOutput {
        ListDatabasesOutput {
            databases: self.registry.summaries(),
            default: self.registry.implicit_name().map(String::from),
            failed: self.registry.failures().to_vec(),
        }
    }

    pub async fn list_tables(&self, input: DatabaseInput) -> DbResult<Vec<TableEntry>> {
        let handle = self.registry.resolve(input.database.as_deref())?;
        let tables = CatalogInspector::list_tables(&handle).await?;
        info!(database = %handle.name, count = tables.len(), "Listed tables");
        Ok(tables)
    }

    pub async fn describe_table(&self, input: TableInput) -> DbResult<Vec<ColumnEntry>> {
        let handle = self.registry.resolve(input.database.as_deref())?;
        let columns = CatalogInspector::describe_table(&handle, &input.table_name).await?;
        info!(
            database = %handle.name,
            table = %input.table_name,
            count = columns.len(),
            "Described table"
        );
        Ok(columns)
    }

    pub async fn list_indexes(&self, input: TableInput) -> DbResult<Vec<IndexEntry>> {
        let handle = self.registry.resolve(input.database.as_deref())?;
        CatalogInspector::list_indexes(&handle, &input.table_name).await
    }

    pub async fn list_constraints(&self, input: TableInput) -> DbResult<Vec<ConstraintEntry>> {
        let handle = self.registry.resolve(input.database.as_deref())?;
        CatalogInspector::list_constraints(&handle, &input.table_name).await
    }
}
