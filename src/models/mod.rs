//! Data models for the gateway.

pub mod catalog;
pub mod query;

pub use catalog::{ColumnEntry, ConstraintEntry, IndexEntry, TableEntry};
pub use query::{ModificationSummary, QueryParam, QueryResult};
