//! Tables exposed as MCP resources.
//!
//! Every table of every registered database is listed under its
//! database-qualified address; reading one returns a preview of its rows.

pub mod address;

pub use address::{RESOURCE_SCHEME, ResourceAddress};

use crate::db::catalog::preview_sql;
use crate::db::identifier::is_safe_identifier;
use crate::db::{CatalogInspector, PoolRegistry, QueryExecutor};
use crate::error::{DbError, DbResult};
use rmcp::model::{AnnotateAble, RawResource, Resource, ResourceContents};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const RESOURCE_MIME_TYPE: &str = "application/json";

/// Handler for resource listing and reads.
pub struct ResourceHandler {
    registry: Arc<PoolRegistry>,
}

impl ResourceHandler {
    pub fn new(registry: Arc<PoolRegistry>) -> Self {
        Self { registry }
    }

    /// List tables across all databases.
    ///
    /// A database whose catalog cannot be read is skipped, as are tables whose
    /// names could not be addressed.
    pub async fn list(&self) -> Vec<Resource> {
        let mut resources = Vec::new();
        for handle in self.registry.handles() {
            let tables = match CatalogInspector::list_tables(&handle).await {
                Ok(tables) => tables,
                Err(e) => {
                    warn!(
                        database = %handle.name,
                        error = %e,
                        "Skipping database in resource list"
                    );
                    continue;
                }
            };

            for table in tables {
                let addressable = is_safe_identifier(&table.table_schema)
                    && is_safe_identifier(&table.table_name);
                if !addressable {
                    debug!(
                        database = %handle.name,
                        schema = %table.table_schema,
                        table = %table.table_name,
                        "Table name is not addressable"
                    );
                    continue;
                }
                let address = ResourceAddress {
                    database: handle.name.clone(),
                    schema: table.table_schema,
                    table: table.table_name,
                };
                resources.push(to_resource(&address));
            }
        }

        info!(count = resources.len(), "Listed resources");
        resources
    }

    /// Read up to 100 rows of the addressed table as pretty-printed JSON.
    pub async fn read(&self, uri: &str) -> DbResult<ResourceContents> {
        let address = address::parse(uri, &self.registry.names(), self.registry.implicit_name())?;
        let handle = self.registry.resolve(Some(&address.database))?;
        let sql = preview_sql(&address.schema, &address.table)?;

        let result = QueryExecutor::new().execute(&handle, &sql, &[]).await?;
        info!(
            database = %address.database,
            schema = %address.schema,
            table = %address.table,
            rows = result.rows.len(),
            "Read resource"
        );

        let text = serde_json::to_string_pretty(&result.rows)
            .map_err(|e| DbError::internal(e.to_string()))?;
        Ok(json_contents(text, uri))
    }
}

pub fn to_resource(address: &ResourceAddress) -> Resource {
    let mut raw = RawResource::new(
        address.uri(),
        format!("{}.{}.{}", address.database, address.schema, address.table),
    );
    raw.description = Some(format!(
        "Table {} in schema {}",
        address.table, address.schema
    ));
    raw.mime_type = Some(RESOURCE_MIME_TYPE.to_string());
    raw.no_annotation()
}

fn json_contents(text: String, uri: &str) -> ResourceContents {
    let mut contents = ResourceContents::text(text, uri);
    if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
        *mime_type = Some(RESOURCE_MIME_TYPE.to_string());
    }
    contents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_resource_fields() {
        let address = ResourceAddress {
            database: "main".into(),
            schema: "public".into(),
            table: "users".into(),
        };
        let resource = to_resource(&address);
        assert_eq!(resource.raw.uri, "postgres://main/public/users");
        assert_eq!(resource.raw.name, "main.public.users");
        assert_eq!(
            resource.raw.description.as_deref(),
            Some("Table users in schema public")
        );
        assert_eq!(resource.raw.mime_type.as_deref(), Some(RESOURCE_MIME_TYPE));
    }

    #[test]
    fn test_json_contents_mime_type() {
        match json_contents("[]".to_string(), "postgres://main/public/users") {
            ResourceContents::TextResourceContents {
                uri,
                mime_type,
                text,
                ..
            } => {
                assert_eq!(uri, "postgres://main/public/users");
                assert_eq!(mime_type.as_deref(), Some(RESOURCE_MIME_TYPE));
                assert_eq!(text, "[]");
            }
            other => panic!("unexpected contents: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_rejects_bad_address_without_database_call() {
        let handler = ResourceHandler::new(Arc::new(PoolRegistry::new()));
        let err = handler.read("postgres://public/users;--").await.unwrap_err();
        assert!(matches!(err, DbError::Address { .. }));
    }
}
