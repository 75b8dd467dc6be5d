//! Logical dump and replay of a database file
//!
//! A dump is a text file of SQL statements that rebuilds schema and data
//! from scratch. [`Dumper`] produces one from a live database file;
//! [`Restorer`] replays one into a fresh database file.
//!
//! Two implementations exist:
//! - [`Sqlite3Cli`] shells out to the `sqlite3` command-line shell
//! - [`NativeDump`] does the same in-process through the embedded SQLite

mod native;
mod sqlite_cli;

pub use native::NativeDump;
pub use sqlite_cli::Sqlite3Cli;

use crate::errors::Result;
use sqlsnap_core::config::{DumpTool, SqlsnapConfig};
use std::path::Path;

/// Serializes the full logical content of a database file to a dump file
pub trait Dumper {
    /// Write a dump of `db_path` to `target`, truncating any existing file
    ///
    /// # Errors
    ///
    /// Any failure of the underlying mechanism. A partial `target` may remain.
    fn dump(&self, db_path: &Path, target: &Path) -> Result<()>;
}

/// Rebuilds a database file from a dump
pub trait Restorer {
    /// Replay the statements in `dump` against the database at `db_path`
    ///
    /// # Errors
    ///
    /// Any failure reading the dump or executing its statements.
    fn replay(&self, dump: &Path, db_path: &Path) -> Result<()>;
}

impl<T: Dumper + ?Sized> Dumper for &T {
    fn dump(&self, db_path: &Path, target: &Path) -> Result<()> {
        (**self).dump(db_path, target)
    }
}

impl<T: Restorer + ?Sized> Restorer for &T {
    fn replay(&self, dump: &Path, db_path: &Path) -> Result<()> {
        (**self).replay(dump, db_path)
    }
}

/// The dump mechanism selected by configuration
#[derive(Debug, Clone)]
pub enum DumpBackend {
    Sqlite3(Sqlite3Cli),
    Native(NativeDump),
}

impl DumpBackend {
    pub fn from_config(config: &SqlsnapConfig) -> Self {
        match config.dump_tool {
            DumpTool::Sqlite3 => DumpBackend::Sqlite3(Sqlite3Cli::new(&config.sqlite3_binary)),
            DumpTool::Native => DumpBackend::Native(NativeDump),
        }
    }
}

impl Dumper for DumpBackend {
    fn dump(&self, db_path: &Path, target: &Path) -> Result<()> {
        match self {
            DumpBackend::Sqlite3(cli) => cli.dump(db_path, target),
            DumpBackend::Native(native) => native.dump(db_path, target),
        }
    }
}

impl Restorer for DumpBackend {
    fn replay(&self, dump: &Path, db_path: &Path) -> Result<()> {
        match self {
            DumpBackend::Sqlite3(cli) => cli.replay(dump, db_path),
            DumpBackend::Native(native) => native.replay(dump, db_path),
        }
    }
}
