//! Bulk loading of tabular data into a named table

use crate::access::table::Table;
use crate::db::{quote_ident, table_exists};
use crate::errors::{from_rusqlite, invalid_input, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Name of the column added when the row position is loaded
pub const ROW_INDEX_COLUMN: &str = "index";

/// What to do when the target table already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Drop the existing table and recreate it from the data
    #[default]
    Replace,
    /// Insert into the existing table, creating it if absent
    Append,
    /// Refuse to touch an existing table
    Fail,
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "replace" => Ok(ConflictPolicy::Replace),
            "append" => Ok(ConflictPolicy::Append),
            "fail" => Ok(ConflictPolicy::Fail),
            other => Err(format!(
                "unknown conflict policy '{}', expected replace, append or fail",
                other
            )),
        }
    }
}

/// Load `data` into `table` inside a single transaction
///
/// Returns the number of rows inserted.
pub(crate) fn load_table(
    conn: &mut Connection,
    table: &str,
    data: &Table,
    policy: ConflictPolicy,
    include_row_index: bool,
) -> Result<usize> {
    if table.trim().is_empty() {
        return Err(invalid_input("bulk_load", "table name must not be empty"));
    }
    if data.columns.is_empty() && !include_row_index {
        return Err(invalid_input("bulk_load", "data has no columns"));
    }
    if let Some(bad) = data.rows.iter().position(|r| r.len() != data.columns.len()) {
        return Err(invalid_input(
            "bulk_load",
            format!("row {} does not match the {} columns", bad, data.columns.len()),
        ));
    }

    let mut columns: Vec<(String, &'static str)> = Vec::with_capacity(data.columns.len() + 1);
    if include_row_index {
        columns.push((ROW_INDEX_COLUMN.to_string(), "INTEGER"));
    }
    for (idx, name) in data.columns.iter().enumerate() {
        columns.push((name.clone(), infer_affinity(data, idx)));
    }

    let tx = conn.transaction().map_err(from_rusqlite)?;
    let exists = table_exists(&tx, table)?;
    let quoted = quote_ident(table);

    match (policy, exists) {
        (ConflictPolicy::Fail, true) => {
            return Err(invalid_input(
                "bulk_load",
                format!("table '{}' already exists", table),
            ));
        }
        (ConflictPolicy::Replace, true) => {
            tx.execute_batch(&format!("DROP TABLE {}", quoted))
                .map_err(from_rusqlite)?;
            create_table(&tx, &quoted, &columns)?;
        }
        (_, false) => create_table(&tx, &quoted, &columns)?,
        (ConflictPolicy::Append, true) => {}
    }

    let column_list = columns
        .iter()
        .map(|(name, _)| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted, column_list, placeholders
    );

    {
        let mut stmt = tx.prepare(&sql).map_err(from_rusqlite)?;
        for (position, row) in data.rows.iter().enumerate() {
            let index = Value::Integer(position as i64);
            let values = include_row_index
                .then_some(&index)
                .into_iter()
                .chain(row.iter());
            stmt.execute(params_from_iter(values))
                .map_err(from_rusqlite)?;
        }
    }

    tx.commit().map_err(from_rusqlite)?;
    Ok(data.rows.len())
}

fn create_table(conn: &Connection, quoted: &str, columns: &[(String, &'static str)]) -> Result<()> {
    let defs = columns
        .iter()
        .map(|(name, affinity)| format!("{} {}", quote_ident(name), affinity))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute_batch(&format!("CREATE TABLE {} ({})", quoted, defs))
        .map_err(from_rusqlite)
}

/// Column affinity from the first non-null value; all-null columns are TEXT
fn infer_affinity(data: &Table, idx: usize) -> &'static str {
    data.rows
        .iter()
        .filter_map(|row| row.get(idx))
        .find(|v| !matches!(v, Value::Null))
        .map(|v| match v {
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Blob(_) => "BLOB",
            _ => "TEXT",
        })
        .unwrap_or("TEXT")
}
