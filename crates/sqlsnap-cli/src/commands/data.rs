//! Query, exec and load commands over the live database

use clap::Args;
use rusqlite::types::Value;
use sqlsnap_core::config::SqlsnapConfig;
use sqlsnap_store::access::{self, ConflictPolicy, Table};
use sqlsnap_store::errors::{invalid_input, io_error};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// A read-only SQL statement with `?` placeholders
    pub sql: String,

    /// Positional parameters; integers and reals are bound as numbers
    #[arg(allow_hyphen_values = true)]
    pub params: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    pub sql: String,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Target table
    pub table: String,

    /// JSON file holding an array of objects
    pub file: PathBuf,

    /// What to do when the table already exists: replace, append or fail
    #[arg(long, default_value = "replace")]
    pub if_exists: ConflictPolicy,

    /// Add an `index` column with each row's position
    #[arg(long)]
    pub index: bool,
}

pub fn query(args: QueryArgs, config: &SqlsnapConfig) -> sqlsnap_core::Result<()> {
    let params: Vec<Value> = args.params.iter().map(String::as_str).map(parse_param).collect();
    let table = access::try_query(&config.database, &args.sql, &params)?;

    let rendered = serde_json::to_string_pretty(&table)
        .map_err(|e| invalid_input("render_query", e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}

pub fn exec(args: ExecArgs, config: &SqlsnapConfig) -> sqlsnap_core::Result<()> {
    let changed = access::try_execute(&config.database, &args.sql)?;
    println!("{} row(s) changed", changed);
    Ok(())
}

pub fn load(args: LoadArgs, config: &SqlsnapConfig) -> sqlsnap_core::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| io_error("read_load_file", &args.file, e))?;
    let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        invalid_input("parse_load_file", e.to_string()).with_path(&args.file)
    })?;
    let data = Table::from_json_rows(&json)?;

    let loaded = access::try_bulk_load(
        &config.database,
        &args.table,
        &data,
        args.if_exists,
        args.index,
    )?;
    println!("Loaded {} row(s) into {}", loaded, args.table);
    Ok(())
}

fn parse_param(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        Value::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Real(f)
    } else {
        Value::Text(raw.to_string())
    }
}
