//! sqlsnap Store - SQLite access and the snapshot lifecycle
//!
//! Provides:
//! - Generic query / execute / bulk-load helpers over a database file
//! - Pluggable logical dump and replay (`sqlite3` shell or in-process)
//! - Snapshot catalog, writer and restore executor over a backup directory

pub mod access;
pub mod db;
pub mod dump;
pub mod errors;
pub mod snapshot;

// Re-export key types
pub use access::{ConflictPolicy, Table};
pub use dump::{DumpBackend, Dumper, NativeDump, Restorer, Sqlite3Cli};
pub use errors::Result;
pub use snapshot::{
    CatalogListing, DatabaseLock, RestoreExecutor, Snapshot, SnapshotCatalog, SnapshotWriter,
};
