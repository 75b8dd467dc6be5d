//! Snapshot lifecycle
//!
//! ## Responsibilities
//!
//! - Name dumps by creation instant so directory order is time order
//! - List and select snapshots in a backup directory
//! - Produce new dumps from the live database
//! - Replace the live database from a chosen dump
//!
//! ## Non-Responsibilities
//!
//! - Retention or rotation of old snapshots
//! - Coordinating writers of the live database (callers must serialize
//!   access; [`DatabaseLock`] only guards against other sqlsnap runs)

pub mod catalog;
pub mod lock;
pub mod restore;
pub mod writer;

use sqlsnap_core::naming::SnapshotName;
use std::path::{Path, PathBuf};

pub use catalog::{CatalogListing, SnapshotCatalog};
pub use lock::DatabaseLock;
pub use restore::RestoreExecutor;
pub use writer::SnapshotWriter;

/// A dump file in a backup directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    name: SnapshotName,
    path: PathBuf,
    dir: PathBuf,
}

impl Snapshot {
    pub fn new(dir: &Path, name: SnapshotName) -> Self {
        Self {
            path: dir.join(name.as_str()),
            dir: dir.to_path_buf(),
            name,
        }
    }

    pub fn name(&self) -> &SnapshotName {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
