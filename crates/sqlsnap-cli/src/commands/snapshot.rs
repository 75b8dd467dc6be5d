//! Snapshot create, list, latest and restore commands

use clap::{Args, Subcommand};
use sqlsnap_core::config::{RestoreMode, SqlsnapConfig};
use sqlsnap_core::{ExError, ExErrorKind};
use sqlsnap_store::{CatalogListing, DumpBackend, RestoreExecutor, SnapshotCatalog, SnapshotWriter};

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Dump the live database into a new timestamped snapshot
    Create,
    /// List valid snapshots, oldest first
    List,
    /// Print the most recent snapshot
    Latest,
    /// Replace the live database from a snapshot
    Restore(RestoreArgs),
}

#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Snapshot filename (defaults to the latest)
    #[arg(long)]
    pub name: Option<String>,

    /// Replay into a staging file and validate it before replacing the live file
    #[arg(long)]
    pub staged: bool,
}

pub fn execute(args: SnapshotArgs, config: &SqlsnapConfig) -> sqlsnap_core::Result<()> {
    match args.command {
        SnapshotCommand::Create => execute_create(config),
        SnapshotCommand::List => execute_list(config),
        SnapshotCommand::Latest => execute_latest(config),
        SnapshotCommand::Restore(restore_args) => execute_restore(restore_args, config),
    }
}

fn execute_create(config: &SqlsnapConfig) -> sqlsnap_core::Result<()> {
    let snapshot = SnapshotWriter::new(DumpBackend::from_config(config))
        .with_lock(config.lock)
        .write(&config.backup_dir, &config.database)?;

    println!("Snapshot written:");
    println!("  name: {}", snapshot.name());
    println!("  path: {}", snapshot.path().display());
    Ok(())
}

fn execute_list(config: &SqlsnapConfig) -> sqlsnap_core::Result<()> {
    match SnapshotCatalog::new(&config.backup_dir).list_typed() {
        CatalogListing::Missing => {
            eprintln!("Backup directory {} does not exist", config.backup_dir.display());
        }
        CatalogListing::Unreadable { reason } => {
            return Err(ExError::new(ExErrorKind::DirectoryUnavailable)
                .with_op("list_snapshots")
                .with_path(&config.backup_dir)
                .with_message(reason));
        }
        CatalogListing::Snapshots(snapshots) => {
            for snapshot in snapshots {
                println!("{}", snapshot.name());
            }
        }
    }
    Ok(())
}

fn execute_latest(config: &SqlsnapConfig) -> sqlsnap_core::Result<()> {
    match SnapshotCatalog::new(&config.backup_dir).latest() {
        Some(snapshot) => println!("{}", snapshot.name()),
        None => eprintln!("No snapshots in {}", config.backup_dir.display()),
    }
    Ok(())
}

fn execute_restore(args: RestoreArgs, config: &SqlsnapConfig) -> sqlsnap_core::Result<()> {
    let mode = if args.staged {
        RestoreMode::Staged
    } else {
        config.restore_mode
    };
    let catalog = SnapshotCatalog::new(&config.backup_dir);

    let snapshot = RestoreExecutor::new(DumpBackend::from_config(config))
        .with_mode(mode)
        .with_lock(config.lock)
        .restore_named(&catalog, args.name.as_deref(), &config.database)?;

    println!("Restored {} into {}", snapshot.name(), config.database.display());
    Ok(())
}
