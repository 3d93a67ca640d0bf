//! Query-related data models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A positional parameter bound as `$1`, `$2`, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Arrays and objects, bound as jsonb
    Json(JsonValue),
}

impl QueryParam {
    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Json(_) => "json",
        }
    }
}

/// Rows and command metadata produced by one statement.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// Rows affected as reported by the server; row count for plain reads.
    pub row_count: u64,
    /// Leading keyword of the statement, e.g. "INSERT".
    pub command_tag: String,
    pub execution_time_ms: u64,
}

/// Payload of run_modification_query.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModificationSummary {
    pub row_count: u64,
    pub command: String,
    /// Rows produced by a RETURNING clause, if any
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
}

impl From<QueryResult> for ModificationSummary {
    fn from(result: QueryResult) -> Self {
        Self {
            row_count: result.row_count,
            command: result.command_tag,
            rows: result.rows,
        }
    }
}
