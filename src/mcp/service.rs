//! MCP service implementation using rmcp.
//!
//! Tool failures are returned as flagged text content (`Error: ...`) so the
//! session stays usable. Protocol errors come from three places only:
//! resource reads, calls naming an unknown tool, and arguments that do not
//! match a tool's input schema. The last two are rejected by the rmcp router
//! (`invalid_params`) before any handler here runs.

use crate::db::PoolRegistry;
use crate::error::DbResult;
use crate::resources::ResourceHandler;
use crate::tools::{
    DatabaseInput, ExplainToolHandler, QueryInput, QueryToolHandler, SchemaToolHandler,
    SearchInput, SearchOutcome, SearchToolHandler, TableInput,
};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, Implementation, ListResourcesResult, PaginatedRequestParam,
        ProtocolVersion, ReadResourceRequestParam, ReadResourceResult, ServerCapabilities,
        ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

pub const SERVER_NAME: &str = "pg-gateway-mcp";

/// Render a handler result as tool content.
fn render<T: Serialize>(tool: &str, result: DbResult<T>) -> CallToolResult {
    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => error_content(tool, &e),
        },
        Err(e) => error_content(tool, &e),
    }
}

fn error_content(tool: &str, e: &dyn std::fmt::Display) -> CallToolResult {
    warn!(tool, error = %e, "Tool call failed");
    CallToolResult::error(vec![Content::text(format!("Error: {}", e))])
}

#[derive(Clone)]
pub struct DbService {
    registry: Arc<PoolRegistry>,
    tool_router: ToolRouter<Self>,
}

impl DbService {
    pub fn new(registry: Arc<PoolRegistry>) -> Self {
        Self {
            registry,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl DbService {
    #[tool(
        description = "List the configured databases.\nReturns the names accepted by the `database` argument of other tools and which one is the default."
    )]
    async fn list_databases(&self) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.registry.clone());
        Ok(render("list_databases", Ok(handler.list_databases())))
    }

    #[tool(description = "List all tables in the database")]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<DatabaseInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.registry.clone());
        Ok(render("list_tables", handler.list_tables(input).await))
    }

    #[tool(description = "Get the schema information for a specific table")]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<TableInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.registry.clone());
        Ok(render("describe_table", handler.describe_table(input).await))
    }

    #[tool(description = "List all indexes for a specific table")]
    async fn list_indexes(
        &self,
        Parameters(input): Parameters<TableInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.registry.clone());
        Ok(render("list_indexes", handler.list_indexes(input).await))
    }

    #[tool(description = "List all constraints for a specific table")]
    async fn list_constraints(
        &self,
        Parameters(input): Parameters<TableInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.registry.clone());
        Ok(render("list_constraints", handler.list_constraints(input).await))
    }

    #[tool(
        description = "Search for a term in all text columns of a table.\nMatches case-insensitively and returns at most 50 rows."
    )]
    async fn search_in_table(
        &self,
        Parameters(input): Parameters<SearchInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SearchToolHandler::new(self.registry.clone());
        Ok(match handler.search(input).await {
            Ok(SearchOutcome::Message(message)) => {
                CallToolResult::success(vec![Content::text(message)])
            }
            Ok(SearchOutcome::Rows(rows)) => render("search_in_table", Ok(rows)),
            Err(e) => error_content("search_in_table", &e),
        })
    }

    #[tool(
        description = "Run a read-only SQL query.\nOnly statements starting with SELECT, WITH, EXPLAIN or VALUES are accepted."
    )]
    async fn run_read_only_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = QueryToolHandler::new(self.registry.clone());
        Ok(render("run_read_only_query", handler.run_read_only(input).await))
    }

    #[tool(description = "Get the execution plan for a SQL query")]
    async fn explain_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = ExplainToolHandler::new(self.registry.clone());
        Ok(render("explain_query", handler.explain(input).await))
    }

    #[tool(
        description = "Run a SQL statement that modifies data or schema (INSERT, UPDATE, DELETE, DDL).\nReturns the affected row count, the command and any RETURNING rows."
    )]
    async fn run_modification_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = QueryToolHandler::new(self.registry.clone());
        Ok(render(
            "run_modification_query",
            handler.run_modification(input).await,
        ))
    }
}

#[tool_handler]
impl ServerHandler for DbService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.to_owned(),
                title: Some("PostgreSQL MCP Gateway".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "PostgreSQL introspection and query tools over one or more databases.\n\
                \n\
                ## Choosing a database\n\
                Call `list_databases` to see the configured names. Every other tool takes an\n\
                optional `database` argument; when omitted the default database is used, or the\n\
                only one when a single database is configured.\n\
                \n\
                ## Queries\n\
                - `run_read_only_query` accepts statements starting with SELECT, WITH, EXPLAIN or VALUES\n\
                - `run_modification_query` runs anything else\n\
                - Both take `params` bound to $1, $2, ...\n\
                \n\
                ## Resources\n\
                Tables are listed as `postgres://{database}/{schema}/{table}`; reading one returns\n\
                up to 100 rows as JSON."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = ResourceHandler::new(self.registry.clone()).list().await;
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let contents = ResourceHandler::new(self.registry.clone())
            .read(&request.uri)
            .await
            .map_err(|e| {
                warn!(uri = %request.uri, error = %e, "Resource read failed");
                McpError::from(e)
            })?;
        Ok(ReadResourceResult {
            contents: vec![contents],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    fn create_test_service() -> DbService {
        DbService::new(Arc::new(PoolRegistry::new()))
    }

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect()
    }

    #[test]
    fn test_server_info() {
        let info = create_test_service().get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
    }

    #[test]
    fn test_render_success_is_pretty_json() {
        let result = render("t", Ok(serde_json::json!({"a": 1})));
        assert_eq!(result.is_error, Some(false));
        assert_eq!(text_of(&result), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_render_error_is_flagged_text() {
        let result = render::<()>("t", Err(DbError::validation("bad input")));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Error: bad input");
    }

    #[tokio::test]
    async fn test_tool_error_never_becomes_fault() {
        let service = create_test_service();
        let input = QueryInput {
            sql_query: "DROP TABLE users".to_string(),
            params: vec![],
            database: None,
        };
        let result = service
            .run_read_only_query(Parameters(input))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("Error: Query is not read-only"));
    }

    #[tokio::test]
    async fn test_list_tables_without_databases() {
        let service = create_test_service();
        let result = service
            .list_tables(Parameters(DatabaseInput::default()))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("Available databases: (none)"));
    }

    #[test]
    fn test_list_databases_succeeds_on_empty_registry() {
        let service = create_test_service();
        let result = tokio_test::block_on(service.list_databases()).unwrap();
        assert_eq!(result.is_error, Some(false));
        let json: serde_json::Value = serde_json::from_str(&text_of(&result)).unwrap();
        assert_eq!(json["databases"], serde_json::json!([]));
    }

    #[test]
    fn test_schema_mismatch_rejected_before_handler() {
        // rmcp deserializes these into `Parameters<T>`; a failure here is an
        // `invalid_params` protocol error, not flagged tool content.
        assert!(serde_json::from_value::<TableInput>(serde_json::json!({})).is_err());
        assert!(
            serde_json::from_value::<QueryInput>(serde_json::json!({"sql_query": 1})).is_err()
        );
        assert!(serde_json::from_value::<DatabaseInput>(serde_json::json!({})).is_ok());
    }

    #[test]
    fn test_all_tools_registered() {
        let service = create_test_service();
        let mut names: Vec<String> = service
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "describe_table",
                "explain_query",
                "list_constraints",
                "list_databases",
                "list_indexes",
                "list_tables",
                "run_modification_query",
                "run_read_only_query",
                "search_in_table",
            ]
        );
    }
}
