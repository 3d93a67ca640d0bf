//! Catalog introspection for PostgreSQL.
//!
//! SQL lives in the `queries` submodule. Catalog columns are cast to `text` so
//! that domain types such as `sql_identifier` decode as plain strings.

use crate::db::identifier::{is_safe_identifier, quote_identifier};
use crate::db::registry::ConnectionHandle;
use crate::error::{DbError, DbResult};
use crate::models::{ColumnEntry, ConstraintEntry, IndexEntry, TableEntry};
use sqlx::Row;
use tracing::debug;

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT table_schema::text AS table_schema,
               table_name::text AS table_name,
               table_type::text AS table_type
        FROM information_schema.tables
        WHERE table_schema NOT IN ('information_schema', 'pg_catalog')
        ORDER BY table_schema, table_name
    "#;

    pub const DESCRIBE_TABLE: &str = r#"
        SELECT column_name::text AS column_name,
               data_type::text AS data_type,
               is_nullable::text AS is_nullable,
               column_default::text AS column_default
        FROM information_schema.columns
        WHERE table_name = $1
        ORDER BY ordinal_position
    "#;

    pub const LIST_INDEXES: &str = r#"
        SELECT i.relname::text AS index_name,
               a.attname::text AS column_name,
               ix.indisunique AS is_unique,
               ix.indisprimary AS is_primary
        FROM pg_class t,
             pg_class i,
             pg_index ix,
             pg_attribute a
        WHERE t.oid = ix.indrelid
          AND i.oid = ix.indexrelid
          AND a.attrelid = t.oid
          AND a.attnum = ANY(ix.indkey)
          AND t.relkind = 'r'
          AND t.relname = $1
        ORDER BY t.relname, i.relname
    "#;

    pub const LIST_CONSTRAINTS: &str = r#"
        SELECT conname::text AS constraint_name,
               contype::text AS constraint_type,
               pg_get_constraintdef(oid) AS definition
        FROM pg_constraint
        WHERE conrelid = $1::regclass
    "#;

    pub const TEXT_COLUMNS: &str = r#"
        SELECT column_name::text AS column_name
        FROM information_schema.columns
        WHERE table_name = $1
          AND data_type IN ('text', 'character varying', 'character', 'char', 'name')
        ORDER BY ordinal_position
    "#;
}

/// Maximum rows returned by a table search.
pub const SEARCH_ROW_LIMIT: u32 = 50;

/// Maximum rows returned by a resource preview.
pub const PREVIEW_ROW_LIMIT: u32 = 100;

/// Human-readable label for a `pg_constraint.contype` code.
///
/// Unknown codes are returned unchanged.
pub fn constraint_type_label(code: &str) -> &str {
    match code {
        "p" => "PRIMARY KEY",
        "f" => "FOREIGN KEY",
        "u" => "UNIQUE",
        "c" => "CHECK",
        "t" => "TRIGGER",
        "x" => "EXCLUSION",
        other => other,
    }
}

/// Catalog inspector for a single database.
pub struct CatalogInspector;

impl CatalogInspector {
    /// Tables and views outside the system schemas, ordered by schema then name.
    pub async fn list_tables(handle: &ConnectionHandle) -> DbResult<Vec<TableEntry>> {
        let rows = sqlx::query(queries::LIST_TABLES)
            .fetch_all(&handle.pool)
            .await?;

        let tables = rows
            .iter()
            .map(|row| {
                Ok(TableEntry {
                    table_schema: row.try_get("table_schema")?,
                    table_name: row.try_get("table_name")?,
                    table_type: row.try_get("table_type")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        debug!(database = %handle.name, count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Columns of every table called `table_name`, in declaration order.
    ///
    /// A table that does not exist yields an empty list.
    pub async fn describe_table(
        handle: &ConnectionHandle,
        table_name: &str,
    ) -> DbResult<Vec<ColumnEntry>> {
        let rows = sqlx::query(queries::DESCRIBE_TABLE)
            .bind(table_name)
            .fetch_all(&handle.pool)
            .await?;

        let columns = rows
            .iter()
            .map(|row| {
                Ok(ColumnEntry {
                    column_name: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                    is_nullable: row.try_get("is_nullable")?,
                    column_default: row.try_get("column_default")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        debug!(
            database = %handle.name,
            table = table_name,
            count = columns.len(),
            "Described table"
        );
        Ok(columns)
    }

    pub async fn list_indexes(
        handle: &ConnectionHandle,
        table_name: &str,
    ) -> DbResult<Vec<IndexEntry>> {
        let rows = sqlx::query(queries::LIST_INDEXES)
            .bind(table_name)
            .fetch_all(&handle.pool)
            .await?;

        let indexes = rows
            .iter()
            .map(|row| {
                Ok(IndexEntry {
                    index_name: row.try_get("index_name")?,
                    column_name: row.try_get("column_name")?,
                    is_unique: row.try_get("is_unique")?,
                    is_primary: row.try_get("is_primary")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        debug!(
            database = %handle.name,
            table = table_name,
            count = indexes.len(),
            "Listed indexes"
        );
        Ok(indexes)
    }

    /// Constraints of `table_name`. The name goes through `regclass`, so an
    /// unknown table is a database error rather than an empty list.
    pub async fn list_constraints(
        handle: &ConnectionHandle,
        table_name: &str,
    ) -> DbResult<Vec<ConstraintEntry>> {
        let rows = sqlx::query(queries::LIST_CONSTRAINTS)
            .bind(table_name)
            .fetch_all(&handle.pool)
            .await?;

        let constraints = rows
            .iter()
            .map(|row| {
                let constraint_type: String = row.try_get("constraint_type")?;
                Ok(ConstraintEntry {
                    constraint_name: row.try_get("constraint_name")?,
                    constraint_type_desc: constraint_type_label(&constraint_type).to_string(),
                    constraint_type,
                    definition: row.try_get("definition")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        debug!(
            database = %handle.name,
            table = table_name,
            count = constraints.len(),
            "Listed constraints"
        );
        Ok(constraints)
    }

    /// Names of the character-typed columns of `table_name`.
    pub async fn text_columns(
        handle: &ConnectionHandle,
        table_name: &str,
    ) -> DbResult<Vec<String>> {
        let rows = sqlx::query(queries::TEXT_COLUMNS)
            .bind(table_name)
            .fetch_all(&handle.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get("column_name").map_err(DbError::from))
            .collect()
    }
}

/// Statement returning the first rows of `schema.table`.
///
/// Both names must already be safe identifiers.
pub fn preview_sql(schema: &str, table: &str) -> DbResult<String> {
    if !is_safe_identifier(schema) || !is_safe_identifier(table) {
        return Err(DbError::address("Invalid schema or table name in URI"));
    }
    Ok(format!(
        "SELECT * FROM {}.{} LIMIT {}",
        quote_identifier(schema),
        quote_identifier(table),
        PREVIEW_ROW_LIMIT
    ))
}
