//! Snapshot catalog
//!
//! Observes a backup directory and classifies its entries. Anything that is
//! not a regular file with a valid snapshot name is ignored, never reported
//! as corruption.

use crate::snapshot::Snapshot;
use sqlsnap_core::errors::NameError;
use sqlsnap_core::naming::{SnapshotName, SNAPSHOT_SUFFIX};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// What a directory scan found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogListing {
    /// The backup directory does not exist
    Missing,
    /// The directory exists but could not be read
    Unreadable { reason: String },
    /// Valid snapshots in ascending chronological order (possibly empty)
    Snapshots(Vec<Snapshot>),
}

impl CatalogListing {
    /// Collapse to the snapshot list; missing and unreadable become empty
    pub fn into_snapshots(self) -> Vec<Snapshot> {
        match self {
            CatalogListing::Snapshots(snapshots) => snapshots,
            CatalogListing::Missing | CatalogListing::Unreadable { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotCatalog {
    dir: PathBuf,
}

impl SnapshotCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Scan the directory, distinguishing "absent" and "unreadable" from "empty"
    pub fn list_typed(&self) -> CatalogListing {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(backup_dir = %self.dir.display(), "Backup directory does not exist");
                return CatalogListing::Missing;
            }
            Err(e) => {
                tracing::warn!(backup_dir = %self.dir.display(), error = %e, "Backup directory unreadable");
                return CatalogListing::Unreadable {
                    reason: e.to_string(),
                };
            }
        };

        let mut names: Vec<SnapshotName> = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(backup_dir = %self.dir.display(), error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            // Follows symlinks, like the `sqlite3` tool will when reading it
            if !entry.path().is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if !file_name.ends_with(SNAPSHOT_SUFFIX) {
                continue;
            }
            match SnapshotName::parse(file_name) {
                Ok(name) => names.push(name),
                Err(e) => log_skipped(&self.dir, &e),
            }
        }

        names.sort();
        CatalogListing::Snapshots(
            names
                .into_iter()
                .map(|name| Snapshot::new(&self.dir, name))
                .collect(),
        )
    }

    /// Valid snapshots in ascending order; empty when the directory is absent or unreadable
    pub fn list(&self) -> Vec<Snapshot> {
        self.list_typed().into_snapshots()
    }

    /// The most recent snapshot, if any
    pub fn latest(&self) -> Option<Snapshot> {
        self.list().pop()
    }

    /// A snapshot by filename, without checking the file exists
    ///
    /// # Errors
    ///
    /// The name fails validation.
    pub fn snapshot(&self, name: &str) -> Result<Snapshot, NameError> {
        Ok(Snapshot::new(&self.dir, SnapshotName::parse(name)?))
    }

    /// The named snapshot, or the latest when `name` is `None`
    ///
    /// # Errors
    ///
    /// The given name fails validation.
    pub fn resolve(&self, name: Option<&str>) -> Result<Option<Snapshot>, NameError> {
        match name {
            Some(name) => self.snapshot(name).map(Some),
            None => Ok(self.latest()),
        }
    }
}

fn log_skipped(dir: &Path, err: &NameError) {
    tracing::debug!(backup_dir = %dir.display(), error = %err, "Ignoring non-snapshot file");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"-- dump\n").unwrap();
    }

    fn names(snapshots: &[Snapshot]) -> Vec<&str> {
        snapshots.iter().map(|s| s.name().as_str()).collect()
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let catalog = SnapshotCatalog::new(dir.path().join("absent"));

        assert_eq!(catalog.list_typed(), CatalogListing::Missing);
        assert!(catalog.list().is_empty());
        assert!(catalog.latest().is_none());
    }

    #[test]
    fn test_path_that_is_a_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, b"x").unwrap();

        let listing = SnapshotCatalog::new(&file).list_typed();
        assert!(matches!(listing, CatalogListing::Unreadable { .. }));
        assert!(SnapshotCatalog::new(&file).latest().is_none());
    }

    #[test]
    fn test_empty_directory_is_empty_listing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            SnapshotCatalog::new(dir.path()).list_typed(),
            CatalogListing::Snapshots(Vec::new())
        );
    }

    #[test]
    fn test_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "2024-03-05-14-30-00.sql");
        touch(dir.path(), "2023-12-31-23-59-59.sql");
        touch(dir.path(), "2024-03-05-09-00-00.sql");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "bad.sql");
        touch(dir.path(), "2024-01-01.sql");
        touch(dir.path(), "2024-02-30-00-00-00.sql");
        fs::create_dir(dir.path().join("2025-01-01-00-00-00.sql")).unwrap();

        let catalog = SnapshotCatalog::new(dir.path());
        let listed = catalog.list();

        assert_eq!(
            names(&listed),
            vec![
                "2023-12-31-23-59-59.sql",
                "2024-03-05-09-00-00.sql",
                "2024-03-05-14-30-00.sql",
            ]
        );
        assert_eq!(
            catalog.latest().unwrap().name().as_str(),
            "2024-03-05-14-30-00.sql"
        );
    }

    #[test]
    fn test_snapshot_paths_are_inside_dir() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "2024-03-05-14-30-00.sql");

        let latest = SnapshotCatalog::new(dir.path()).latest().unwrap();
        assert_eq!(latest.dir(), dir.path());
        assert_eq!(latest.path(), dir.path().join("2024-03-05-14-30-00.sql"));
    }

    #[test]
    fn test_resolve_named_and_default() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "2024-01-01-00-00-00.sql");
        touch(dir.path(), "2024-06-01-00-00-00.sql");
        let catalog = SnapshotCatalog::new(dir.path());

        let named = catalog.resolve(Some("2024-01-01-00-00-00.sql")).unwrap().unwrap();
        assert_eq!(named.name().as_str(), "2024-01-01-00-00-00.sql");

        let latest = catalog.resolve(None).unwrap().unwrap();
        assert_eq!(latest.name().as_str(), "2024-06-01-00-00-00.sql");

        assert!(catalog.resolve(Some("latest.sql")).is_err());
    }
}
