//! Error types for the gateway.
//!
//! Every failure a request can hit is a [`DbError`]. Tool handlers render these
//! as flagged text content; resource reads convert them into protocol errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// No target database could be chosen for a request.
    #[error("{message}. Available databases: {}", list_names(.available))]
    Configuration {
        message: String,
        available: Vec<String>,
    },

    /// An explicitly requested database is not registered.
    #[error("Database '{database}' not found. Available databases: {}", list_names(.available))]
    NotFound {
        database: String,
        available: Vec<String>,
    },

    #[error("Invalid resource address: {message}")]
    Address { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    /// Startup configuration could not be loaded or is inconsistent.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn list_names(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

impl DbError {
    pub fn configuration(message: impl Into<String>, available: Vec<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            available,
        }
    }

    pub fn not_found(database: impl Into<String>, available: Vec<String>) -> Self {
        Self::NotFound {
            database: database.into(),
            available,
        }
    }

    pub fn address(message: impl Into<String>) -> Self {
        Self::Address {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Configuration { .. } => {
                Some("Pass the 'database' argument with one of the available names")
            }
            Self::NotFound { .. } => Some("Call list_databases to see the registered names"),
            _ => None,
        }
    }

    /// SQLSTATE reported by the server, for database errors.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Database { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(db_err.message(), code)
            }
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out waiting for a pooled connection",
                "The pool is exhausted or the server is unreachable",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Restart the gateway")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::RowNotFound => DbError::database("No rows returned", None),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::internal(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for gateway operations.
pub type DbResult<T> = Result<T, DbError>;

fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DbError to MCP ErrorData for the surfaces that report protocol errors.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        let data = suggestion_data(err.suggestion());
        match &err {
            DbError::Address { .. }
            | DbError::Validation { .. }
            | DbError::Configuration { .. }
            | DbError::Config { .. } => rmcp::ErrorData::invalid_params(err.to_string(), data),

            DbError::NotFound { .. } => rmcp::ErrorData::resource_not_found(err.to_string(), data),

            DbError::Database {
                message, sql_state, ..
            } => {
                let msg = match sql_state {
                    Some(code) => format!("{} (SQLSTATE: {})", message, code),
                    None => message.clone(),
                };
                rmcp::ErrorData::invalid_params(msg, data)
            }

            DbError::Connection { .. } | DbError::Internal { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), data)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_available_names() {
        let err = DbError::not_found("x", vec!["analytics".into(), "main".into()]);
        assert_eq!(
            err.to_string(),
            "Database 'x' not found. Available databases: analytics, main"
        );
    }

    #[test]
    fn test_configuration_with_no_names() {
        let err = DbError::configuration("No database selected", Vec::new());
        assert_eq!(
            err.to_string(),
            "No database selected. Available databases: (none)"
        );
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = DbError::validation("Invalid table name for search");
        assert_eq!(err.to_string(), "Invalid table name for search");
    }

    #[test]
    fn test_database_error_keeps_sql_state() {
        let err = DbError::database("relation \"nope\" does not exist", Some("42P01".into()));
        assert_eq!(err.sql_state(), Some("42P01"));
        assert_eq!(err.to_string(), "relation \"nope\" does not exist");
    }

    #[test]
    fn test_address_maps_to_invalid_params() {
        let mcp_err: rmcp::ErrorData = DbError::address("bad").into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_not_found_maps_to_resource_not_found() {
        let mcp_err: rmcp::ErrorData = DbError::not_found("x", vec![]).into();
        assert_eq!(mcp_err.code.0, -32002);
        let data = mcp_err.data.expect("suggestion data");
        assert!(data["suggestion"].as_str().is_some());
    }

    #[test]
    fn test_database_error_message_includes_sql_state() {
        let mcp_err: rmcp::ErrorData =
            DbError::database("syntax error", Some("42601".into())).into();
        assert_eq!(mcp_err.code.0, -32602);
        assert!(mcp_err.message.contains("SQLSTATE: 42601"));
    }

    #[test]
    fn test_connection_maps_to_internal_error() {
        let mcp_err: rmcp::ErrorData = DbError::connection("failed", "try again").into();
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[test]
    fn test_pool_timeout_becomes_connection_error() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::Connection { .. }));
    }
}
