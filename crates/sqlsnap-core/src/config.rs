//! Configuration
//!
//! Loaded from a TOML file; every field has a default so an empty or
//! missing file yields a usable configuration.
//!
//! ```toml
//! database = "data/store.db"
//! backup_dir = "data/backups"
//! dump_tool = "sqlite3"
//! restore_mode = "replace"
//! ```

use crate::errors::{ExError, ExErrorKind, Result};
use crate::logging_facility::Profile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which mechanism produces and replays dumps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpTool {
    /// Shell out to the `sqlite3` command-line shell
    #[default]
    Sqlite3,
    /// In-process logical dump through the embedded SQLite library
    Native,
}

/// How a restore replaces the live database file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    /// Delete the live file, then replay into its path.
    /// A failed replay leaves no live database.
    #[default]
    Replace,
    /// Replay into a sibling staging file, validate it, then rename over the live file
    Staged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlsnapConfig {
    pub database: PathBuf,
    pub backup_dir: PathBuf,
    pub dump_tool: DumpTool,
    pub sqlite3_binary: String,
    pub restore_mode: RestoreMode,
    /// Take an advisory lock on the live database during dump and restore
    pub lock: bool,
    pub log_profile: String,
}

impl Default for SqlsnapConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data/store.db"),
            backup_dir: PathBuf::from("data/backups"),
            dump_tool: DumpTool::default(),
            sqlite3_binary: "sqlite3".to_string(),
            restore_mode: RestoreMode::default(),
            lock: true,
            log_profile: "development".to_string(),
        }
    }
}

impl SqlsnapConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// - `ExErrorKind::Io` when the file cannot be read
    /// - `ExErrorKind::Config` when the contents are not valid configuration
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("load_config")
                .with_path(path)
                .with_message(e.to_string())
        })?;
        Self::from_toml_str(&text).map_err(|e| e.with_path(path))
    }

    /// Load configuration, falling back to defaults when the file does not exist
    ///
    /// # Errors
    ///
    /// Same as [`SqlsnapConfig::load`] for a file that exists.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "Config file absent, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// `ExErrorKind::Config` on malformed TOML or unknown enum values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::Config)
                .with_op("parse_config")
                .with_message(e.to_string())
        })
    }

    /// Resolve the configured logging profile
    ///
    /// # Errors
    ///
    /// `ExErrorKind::Config` when the profile name is unknown.
    pub fn profile(&self) -> Result<Profile> {
        self.log_profile.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg = SqlsnapConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, SqlsnapConfig::default());
        assert_eq!(cfg.dump_tool, DumpTool::Sqlite3);
        assert_eq!(cfg.restore_mode, RestoreMode::Replace);
        assert!(cfg.lock);
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let cfg = SqlsnapConfig::from_toml_str(
            r#"
            backup_dir = "/var/backups/app"
            dump_tool = "native"
            restore_mode = "staged"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.backup_dir, PathBuf::from("/var/backups/app"));
        assert_eq!(cfg.dump_tool, DumpTool::Native);
        assert_eq!(cfg.restore_mode, RestoreMode::Staged);
        assert_eq!(cfg.database, PathBuf::from("data/store.db"));
    }

    #[test]
    fn test_unknown_dump_tool_is_config_error() {
        let err = SqlsnapConfig::from_toml_str(r#"dump_tool = "pg_dump""#).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let dir = TempDir::new().unwrap();
        let cfg = SqlsnapConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, SqlsnapConfig::default());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sqlsnap.toml");
        std::fs::write(&path, "database = \"live.db\"\nlock = false\n").unwrap();

        let cfg = SqlsnapConfig::load(&path).unwrap();
        assert_eq!(cfg.database, PathBuf::from("live.db"));
        assert!(!cfg.lock);
    }

    #[test]
    fn test_profile_parse() {
        let mut cfg = SqlsnapConfig::default();
        assert_eq!(cfg.profile().unwrap(), Profile::Development);

        cfg.log_profile = "production".to_string();
        assert_eq!(cfg.profile().unwrap(), Profile::Production);

        cfg.log_profile = "verbose".to_string();
        assert_eq!(cfg.profile().unwrap_err().kind(), ExErrorKind::Config);
    }
}
