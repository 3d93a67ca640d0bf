//! MCP tool implementations.
//!
//! - `schema`: list_databases, list_tables, describe_table, list_indexes, list_constraints
//! - `search`: search_in_table
//! - `query`: run_read_only_query and run_modification_query
//! - `explain`: explain_query
//! - `safety`: read-only classification for ad-hoc SQL

pub mod explain;
pub mod query;
pub mod safety;
pub mod schema;
pub mod search;

pub use explain::ExplainToolHandler;
pub use query::{QueryInput, QueryToolHandler};
pub use safety::{QueryKind, classify};
pub use schema::{DatabaseInput, ListDatabasesOutput, SchemaToolHandler, TableInput};
pub use search::{SearchInput, SearchOutcome, SearchPlan, SearchToolHandler, plan_search};
