//! Rows returned by catalog introspection.
//!
//! Field names match the catalog column names so the JSON payloads read the
//! same as querying the views directly.

use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TableEntry {
    pub table_schema: String,
    pub table_name: String,
    /// "BASE TABLE", "VIEW", ...
    pub table_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ColumnEntry {
    pub column_name: String,
    pub data_type: String,
    /// "YES" or "NO"
    pub is_nullable: String,
    pub column_default: Option<String>,
}

/// One row per (index, column) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct IndexEntry {
    pub index_name: String,
    pub column_name: String,
    pub is_unique: bool,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ConstraintEntry {
    pub constraint_name: String,
    /// Single-letter code from pg_constraint.contype
    pub constraint_type: String,
    pub definition: String,
    pub constraint_type_desc: String,
}
