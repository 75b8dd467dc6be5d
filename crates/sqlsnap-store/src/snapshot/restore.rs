//! Restore executor
//!
//! Replaces the live database file with one rebuilt from a snapshot.
//!
//! In [`RestoreMode::Replace`] the live file is deleted before the replay
//! runs. A failed replay therefore leaves no live database at all; any
//! partially rebuilt file is removed so that post-condition always holds.
//!
//! In [`RestoreMode::Staged`] the replay targets a sibling staging file,
//! which must pass `PRAGMA integrity_check` before it is renamed over the
//! live file. Any failure leaves the live file untouched.

use crate::db;
use crate::dump::Restorer;
use crate::snapshot::{DatabaseLock, Snapshot, SnapshotCatalog};
use sqlsnap_core::config::RestoreMode;
use sqlsnap_core::errors::{ExErrorKind, RestoreError};
use sqlsnap_core::{log_op_end, log_op_error, log_op_start};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Files SQLite may keep next to a database
const SIDECAR_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

#[derive(Debug, Clone)]
pub struct RestoreExecutor<R> {
    restorer: R,
    mode: RestoreMode,
    lock: bool,
}

impl<R: Restorer> RestoreExecutor<R> {
    pub fn new(restorer: R) -> Self {
        Self {
            restorer,
            mode: RestoreMode::Replace,
            lock: false,
        }
    }

    pub fn with_mode(mut self, mode: RestoreMode) -> Self {
        self.mode = mode;
        self
    }

    /// Hold the advisory database lock for the duration of the restore
    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    pub fn mode(&self) -> RestoreMode {
        self.mode
    }

    /// Replace `db_path` with the content of `snapshot`
    ///
    /// # Errors
    ///
    /// - `RestoreError::SnapshotMissing` when the snapshot file does not exist
    ///   (checked before anything is deleted)
    /// - `RestoreError::Locked` when another process holds the database lock
    /// - `RestoreError::CannotRemoveExisting` when the live file cannot be
    ///   deleted or replaced; it is left untouched
    /// - `RestoreError::ReplayFailed` when the dump cannot be replayed. In
    ///   `Replace` mode the live database no longer exists afterwards.
    /// - `RestoreError::ValidationFailed` (`Staged` only) when the rebuilt
    ///   database fails its integrity check
    pub fn restore(&self, snapshot: &Snapshot, db_path: &Path) -> Result<(), RestoreError> {
        let started = Instant::now();
        log_op_start!(
            "restore_snapshot",
            snapshot = snapshot.name().as_str(),
            db_path = %db_path.display(),
            mode = ?self.mode
        );

        let result = self.restore_inner(snapshot, db_path);
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => {
                log_op_end!(
                    "restore_snapshot",
                    duration_ms = duration_ms,
                    snapshot = snapshot.name().as_str()
                );
            }
            Err(e) => {
                log_op_error!("restore_snapshot", e.clone(), duration_ms = duration_ms);
            }
        }
        result
    }

    /// Restore the most recent snapshot in `catalog`
    ///
    /// # Errors
    ///
    /// `RestoreError::NoSnapshots` when the catalog is empty, otherwise as
    /// [`RestoreExecutor::restore`].
    pub fn restore_latest(
        &self,
        catalog: &SnapshotCatalog,
        db_path: &Path,
    ) -> Result<Snapshot, RestoreError> {
        self.restore_named(catalog, None, db_path)
    }

    /// Restore the snapshot called `name`, or the latest when `None`
    ///
    /// # Errors
    ///
    /// `RestoreError::InvalidName` for a malformed name, `NoSnapshots` when
    /// defaulting to latest on an empty catalog, otherwise as
    /// [`RestoreExecutor::restore`].
    pub fn restore_named(
        &self,
        catalog: &SnapshotCatalog,
        name: Option<&str>,
        db_path: &Path,
    ) -> Result<Snapshot, RestoreError> {
        let snapshot = catalog
            .resolve(name)?
            .ok_or_else(|| RestoreError::NoSnapshots {
                dir: catalog.dir().to_path_buf(),
            })?;
        self.restore(&snapshot, db_path)?;
        Ok(snapshot)
    }

    fn restore_inner(&self, snapshot: &Snapshot, db_path: &Path) -> Result<(), RestoreError> {
        if !snapshot.path().is_file() {
            return Err(RestoreError::SnapshotMissing {
                path: snapshot.path().to_path_buf(),
            });
        }

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RestoreError::CannotRemoveExisting {
                path: db_path.to_path_buf(),
                reason: format!("cannot create parent directory: {}", e),
            })?;
        }

        let _guard = if self.lock {
            Some(DatabaseLock::acquire(db_path).map_err(|e| match e.kind() {
                ExErrorKind::Locked => RestoreError::Locked {
                    path: db_path.to_path_buf(),
                },
                _ => RestoreError::CannotRemoveExisting {
                    path: db_path.to_path_buf(),
                    reason: e.to_string(),
                },
            })?)
        } else {
            None
        };

        match self.mode {
            RestoreMode::Replace => self.replace(snapshot, db_path),
            RestoreMode::Staged => self.staged(snapshot, db_path),
        }
    }

    fn replace(&self, snapshot: &Snapshot, db_path: &Path) -> Result<(), RestoreError> {
        remove_if_exists(db_path).map_err(|e| RestoreError::CannotRemoveExisting {
            path: db_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        remove_sidecars(db_path);

        if let Err(e) = self.restorer.replay(snapshot.path(), db_path) {
            // Leave no half-built database behind
            if let Err(cleanup) = remove_if_exists(db_path) {
                tracing::warn!(
                    db_path = %db_path.display(),
                    error = %cleanup,
                    "Failed to remove partially restored database"
                );
            }
            remove_sidecars(db_path);
            return Err(RestoreError::ReplayFailed {
                path: snapshot.path().to_path_buf(),
                reason: e.to_string(),
            });
        }
        Ok(())
    }

    fn staged(&self, snapshot: &Snapshot, db_path: &Path) -> Result<(), RestoreError> {
        let staging = staging_path(db_path);
        discard(&staging);

        if let Err(e) = self.restorer.replay(snapshot.path(), &staging) {
            discard(&staging);
            return Err(RestoreError::ReplayFailed {
                path: snapshot.path().to_path_buf(),
                reason: e.to_string(),
            });
        }

        if let Err(reason) = validate(&staging) {
            discard(&staging);
            return Err(RestoreError::ValidationFailed {
                path: staging,
                reason,
            });
        }

        // Persist staged content before it becomes visible under the live name
        if let Err(e) = File::open(&staging).and_then(|f| f.sync_all()) {
            discard(&staging);
            return Err(RestoreError::ValidationFailed {
                path: staging,
                reason: format!("fsync failed: {}", e),
            });
        }

        if let Err(e) = fs::rename(&staging, db_path) {
            discard(&staging);
            return Err(RestoreError::CannotRemoveExisting {
                path: db_path.to_path_buf(),
                reason: e.to_string(),
            });
        }
        remove_sidecars(db_path);
        sync_parent(db_path);
        Ok(())
    }
}

/// Sibling path the staged restore builds into
pub fn staging_path(db_path: &Path) -> PathBuf {
    with_suffix(db_path, ".restore-tmp")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn discard(staging: &Path) {
    if let Err(e) = remove_if_exists(staging) {
        tracing::warn!(path = %staging.display(), error = %e, "Failed to remove staging file");
    }
    remove_sidecars(staging);
}

fn remove_sidecars(db_path: &Path) {
    for suffix in SIDECAR_SUFFIXES {
        let sidecar = with_suffix(db_path, suffix);
        if let Err(e) = remove_if_exists(&sidecar) {
            tracing::warn!(path = %sidecar.display(), error = %e, "Failed to remove stale SQLite sidecar");
        }
    }
}

fn validate(path: &Path) -> Result<(), String> {
    let conn = db::open_read_only(path).map_err(|e| e.to_string())?;
    let verdict: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .map_err(|e| e.to_string())?;
    if verdict == "ok" {
        Ok(())
    } else {
        Err(format!("integrity_check reported: {}", verdict))
    }
}

#[cfg(unix)]
fn sync_parent(db_path: &Path) {
    let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    if let Err(e) = File::open(parent).and_then(|d| d.sync_all()) {
        tracing::warn!(dir = %parent.display(), error = %e, "Failed to fsync database directory");
    }
}

#[cfg(not(unix))]
fn sync_parent(_db_path: &Path) {}
