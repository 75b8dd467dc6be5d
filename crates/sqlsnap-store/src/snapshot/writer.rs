//! Snapshot writer
//!
//! Produces a new dump of the live database under a name derived from the
//! current instant. Two writes in the same second target the same file and
//! the second overwrites the first.

use crate::dump::Dumper;
use crate::snapshot::{DatabaseLock, Snapshot};
use sqlsnap_core::errors::{ExErrorKind, SnapshotError};
use sqlsnap_core::naming::{encode, SnapshotInstant};
use sqlsnap_core::{log_op_end, log_op_error, log_op_start};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SnapshotWriter<D> {
    dumper: D,
    lock: bool,
}

impl<D: Dumper> SnapshotWriter<D> {
    pub fn new(dumper: D) -> Self {
        Self {
            dumper,
            lock: false,
        }
    }

    /// Hold the advisory database lock for the duration of the dump
    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    /// Dump `db_path` into `backup_dir` named after the current instant
    ///
    /// # Errors
    ///
    /// See [`SnapshotWriter::write_at`].
    pub fn write(&self, backup_dir: &Path, db_path: &Path) -> Result<Snapshot, SnapshotError> {
        self.write_at(backup_dir, db_path, SnapshotInstant::now())
    }

    /// Dump `db_path` into `backup_dir` named after `instant`
    ///
    /// The backup directory is created (with parents) when missing.
    ///
    /// # Errors
    ///
    /// - `SnapshotError::DirectoryUnavailable` when the directory cannot be created
    /// - `SnapshotError::Locked` when another process holds the database lock
    /// - `SnapshotError::DumpFailed` when the dump mechanism fails; the
    ///   partially written file is left in place and must not be trusted
    pub fn write_at(
        &self,
        backup_dir: &Path,
        db_path: &Path,
        instant: SnapshotInstant,
    ) -> Result<Snapshot, SnapshotError> {
        let started = Instant::now();
        log_op_start!(
            "write_snapshot",
            backup_dir = %backup_dir.display(),
            db_path = %db_path.display()
        );

        let result = self.write_inner(backup_dir, db_path, instant);
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(snapshot) => {
                log_op_end!(
                    "write_snapshot",
                    duration_ms = duration_ms,
                    snapshot = snapshot.name().as_str()
                );
            }
            Err(e) => {
                log_op_error!("write_snapshot", e.clone(), duration_ms = duration_ms);
            }
        }
        result
    }

    fn write_inner(
        &self,
        backup_dir: &Path,
        db_path: &Path,
        instant: SnapshotInstant,
    ) -> Result<Snapshot, SnapshotError> {
        std::fs::create_dir_all(backup_dir).map_err(|e| SnapshotError::DirectoryUnavailable {
            path: backup_dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let snapshot = Snapshot::new(backup_dir, encode(instant));
        let target = snapshot.path();

        let _guard = if self.lock {
            Some(DatabaseLock::acquire(db_path).map_err(|e| match e.kind() {
                ExErrorKind::Locked => SnapshotError::Locked {
                    path: db_path.to_path_buf(),
                },
                _ => SnapshotError::DumpFailed {
                    path: target.to_path_buf(),
                    reason: e.to_string(),
                },
            })?)
        } else {
            None
        };

        if target.exists() {
            tracing::warn!(
                snapshot = snapshot.name().as_str(),
                "Snapshot for this second already exists and will be overwritten"
            );
        }

        self.dumper
            .dump(db_path, target)
            .map_err(|e| SnapshotError::DumpFailed {
                path: target.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::NativeDump;
    use crate::errors::Result;
    use sqlsnap_core::errors::ExError;
    use tempfile::TempDir;

    struct FailingDumper;

    impl Dumper for FailingDumper {
        fn dump(&self, _db_path: &Path, target: &Path) -> Result<()> {
            std::fs::write(target, b"BEGIN TRANSACTION;\nCREATE TABLE half").unwrap();
            Err(ExError::new(ExErrorKind::ExternalService).with_message("exit status 1"))
        }
    }

    fn live_db(dir: &Path) -> std::path::PathBuf {
        let db = dir.join("live.db");
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute_batch("CREATE TABLE t (x); INSERT INTO t VALUES (1);")
            .unwrap();
        db
    }

    fn at(y: u32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> SnapshotInstant {
        SnapshotInstant::from_ymd_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_write_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let db = live_db(dir.path());
        let backups = dir.path().join("deep").join("backups");

        let snapshot = SnapshotWriter::new(NativeDump)
            .write_at(&backups, &db, at(2024, 3, 5, 14, 30, 0))
            .unwrap();

        assert_eq!(snapshot.name().as_str(), "2024-03-05-14-30-00.sql");
        assert!(snapshot.path().is_file());
    }

    #[test]
    fn test_dump_failure_leaves_partial_file() {
        let dir = TempDir::new().unwrap();
        let db = live_db(dir.path());

        let err = SnapshotWriter::new(FailingDumper)
            .write_at(dir.path(), &db, at(2024, 1, 1, 0, 0, 0))
            .unwrap_err();

        let partial = dir.path().join("2024-01-01-00-00-00.sql");
        assert_eq!(
            err,
            SnapshotError::DumpFailed {
                path: partial.clone(),
                reason: ExError::new(ExErrorKind::ExternalService)
                    .with_message("exit status 1")
                    .to_string(),
            }
        );
        assert!(partial.exists());
    }

    #[test]
    fn test_locked_database_is_refused() {
        let dir = TempDir::new().unwrap();
        let db = live_db(dir.path());
        let _held = DatabaseLock::acquire(&db).unwrap();

        let err = SnapshotWriter::new(NativeDump)
            .with_lock(true)
            .write_at(&dir.path().join("b"), &db, at(2024, 1, 1, 0, 0, 0))
            .unwrap_err();

        assert_eq!(err, SnapshotError::Locked { path: db });
    }

    #[test]
    fn test_directory_blocked_by_file() {
        let dir = TempDir::new().unwrap();
        let db = live_db(dir.path());
        let blocker = dir.path().join("backups");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = SnapshotWriter::new(NativeDump)
            .write(&blocker, &db)
            .unwrap_err();

        assert!(matches!(err, SnapshotError::DirectoryUnavailable { .. }));
    }
}
