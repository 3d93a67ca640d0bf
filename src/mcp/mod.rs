//! MCP server surface: the tool router and resource handlers.

pub mod service;

pub use service::{DbService, SERVER_NAME};
