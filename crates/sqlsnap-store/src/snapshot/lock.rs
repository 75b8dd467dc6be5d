//! Advisory exclusive lock on a live database file
//!
//! The lock lives on a sibling `<db>.lock` file so the database itself can
//! be deleted and recreated while the lock is held. It only excludes other
//! processes that also take it.

use crate::errors::{io_error, Result};
use fs2::FileExt;
use sqlsnap_core::errors::{ExError, ExErrorKind};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct DatabaseLock {
    file: File,
    path: PathBuf,
}

impl DatabaseLock {
    /// Path of the lock file guarding `db_path`
    pub fn lock_path(db_path: &Path) -> PathBuf {
        let mut name: OsString = db_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Take the lock without blocking
    ///
    /// # Errors
    ///
    /// - `ExErrorKind::Locked` when another holder has it
    /// - `ExErrorKind::Io` when the lock file cannot be opened
    pub fn acquire(db_path: &Path) -> Result<Self> {
        let path = Self::lock_path(db_path);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| io_error("open_lock_file", &path, e))?;

        file.try_lock_exclusive().map_err(|_| {
            ExError::new(ExErrorKind::Locked)
                .with_op("acquire_lock")
                .with_path(db_path)
                .with_message("database is in use by another process")
        })?;

        tracing::debug!(lock = %path.display(), "Acquired database lock");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DatabaseLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(lock = %self.path.display(), error = %e, "Failed to release database lock");
        }
    }
}
