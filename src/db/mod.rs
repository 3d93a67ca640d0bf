//! Database layer.
//!
//! - `registry`: named pools and target resolution
//! - `executor`: scoped statement execution
//! - `catalog`: information_schema / pg_catalog introspection
//! - `identifier`: identifier validation and quoting
//! - `types`: row to JSON decoding

pub mod catalog;
pub mod executor;
pub mod identifier;
pub mod params;
pub mod registry;
pub mod types;

pub use catalog::CatalogInspector;
pub use executor::QueryExecutor;
pub use registry::{ConnectionHandle, DatabaseSummary, PoolRegistry, RegistrationFailure};
