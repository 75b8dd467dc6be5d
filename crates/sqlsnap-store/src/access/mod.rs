//! Data access layer
//!
//! Generic read, write and bulk-load operations against a database file.
//! Each opens its own connection, does its work and closes it again.
//!
//! The plain functions (`query`, `execute`, `bulk_load`) degrade to an empty
//! table or `false` on any failure and log the cause. The `try_` variants
//! return the structured error for callers that need it.

mod bulk;
mod table;

pub use bulk::{ConflictPolicy, ROW_INDEX_COLUMN};
pub use table::Table;

use crate::db;
use crate::errors::{from_rusqlite, Result};
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use std::path::Path;

/// Run a read-only parameterized statement and collect its rows
pub fn try_query(db_path: &Path, sql: &str, params: &[Value]) -> Result<Table> {
    let conn = db::open(db_path)?;
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    if !stmt.readonly() {
        return Err(crate::errors::invalid_input(
            "query",
            "statement modifies the database; use execute instead",
        ));
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();
    let mut table = Table::new(columns);

    let mut rows = stmt
        .query(params_from_iter(params.iter()))
        .map_err(from_rusqlite)?;
    while let Some(row) = rows.next().map_err(from_rusqlite)? {
        let values = (0..width)
            .map(|i| row.get::<_, Value>(i))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        table.rows.push(values);
    }
    Ok(table)
}

/// Run a read-only statement; an empty table on any error
pub fn query(db_path: &Path, sql: &str, params: &[Value]) -> Table {
    match try_query(db_path, sql, params) {
        Ok(table) => {
            tracing::debug!(db_path = %db_path.display(), row_count = table.len(), "Query returned rows");
            table
        }
        Err(e) => {
            tracing::error!(db_path = %db_path.display(), error = %e, "Query failed");
            Table::default()
        }
    }
}

/// Execute a single mutating statement with auto-commit
pub fn try_execute(db_path: &Path, sql: &str) -> Result<usize> {
    let conn = db::open(db_path)?;
    conn.execute(sql, []).map_err(from_rusqlite)
}

/// Execute a single mutating statement; `false` on any error
pub fn execute(db_path: &Path, sql: &str) -> bool {
    match try_execute(db_path, sql) {
        Ok(changed) => {
            tracing::debug!(db_path = %db_path.display(), changed, "Statement executed");
            true
        }
        Err(e) => {
            tracing::error!(db_path = %db_path.display(), error = %e, "Statement failed");
            false
        }
    }
}

/// Bulk insert tabular data into a named table
///
/// Returns the number of rows inserted.
pub fn try_bulk_load(
    db_path: &Path,
    table: &str,
    data: &Table,
    policy: ConflictPolicy,
    include_row_index: bool,
) -> Result<usize> {
    let mut conn = db::open(db_path)?;
    bulk::load_table(&mut conn, table, data, policy, include_row_index)
}

/// Bulk insert tabular data; `false` on any error
pub fn bulk_load(
    db_path: &Path,
    table: &str,
    data: &Table,
    policy: ConflictPolicy,
    include_row_index: bool,
) -> bool {
    match try_bulk_load(db_path, table, data, policy, include_row_index) {
        Ok(rows) => {
            tracing::info!(db_path = %db_path.display(), table, row_count = rows, "Loaded table");
            true
        }
        Err(e) => {
            tracing::error!(db_path = %db_path.display(), table, error = %e, "Failed to load table");
            false
        }
    }
}
