//! sqlsnap CLI
//!
//! Command-line interface for timestamped SQLite snapshots

use clap::{Parser, Subcommand};
use sqlsnap_core::config::{DumpTool, SqlsnapConfig};
use sqlsnap_core::logging_facility;
use sqlsnap_core_types::RunId;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sqlsnap")]
#[command(about = "sqlsnap - Timestamped SQLite snapshots and data access", long_about = None)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = "sqlsnap.toml")]
    config: PathBuf,

    /// Live database file (overrides `database`)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Backup directory (overrides `backup_dir`)
    #[arg(long, global = true)]
    backup_dir: Option<PathBuf>,

    /// Dump and replay in-process instead of through the sqlite3 shell
    #[arg(long, global = true)]
    native: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Snapshot operations
    Snapshot(commands::snapshot::SnapshotArgs),
    /// Run a read-only query and print rows as JSON
    Query(commands::data::QueryArgs),
    /// Execute a single mutating statement
    Exec(commands::data::ExecArgs),
    /// Bulk load a JSON array of objects into a table
    Load(commands::data::LoadArgs),
}

impl Cli {
    fn resolve_config(&self) -> sqlsnap_core::Result<SqlsnapConfig> {
        let mut config = SqlsnapConfig::load_or_default(&self.config)?;
        if let Some(db) = &self.db {
            config.database = db.clone();
        }
        if let Some(dir) = &self.backup_dir {
            config.backup_dir = dir.clone();
        }
        if self.native {
            config.dump_tool = DumpTool::Native;
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    match config.profile() {
        Ok(profile) => logging_facility::init(profile),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    let run_id = RunId::new();
    let span = tracing::info_span!("sqlsnap", run_id = %run_id);
    let _enter = span.enter();

    let result = match cli.command {
        Commands::Snapshot(args) => commands::snapshot::execute(args, &config),
        Commands::Query(args) => commands::data::query(args, &config),
        Commands::Exec(args) => commands::data::exec(args, &config),
        Commands::Load(args) => commands::data::load(args, &config),
    };

    if let Err(e) = result {
        let e = e.with_run_id(run_id);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
