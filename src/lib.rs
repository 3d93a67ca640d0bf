//! PostgreSQL gateway for the Model Context Protocol.
//!
//! Exposes catalog introspection, text search and ad-hoc SQL over one or
//! more named PostgreSQL pools, plus every table as a readable resource.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod resources;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use db::PoolRegistry;
pub use error::{DbError, DbResult};
pub use mcp::DbService;
