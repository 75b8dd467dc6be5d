use sqlsnap_core_types::RunId;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Naming/Validation
    InvalidSnapshotName,
    InvalidInput,
    NotFound,

    // Snapshot lifecycle
    DirectoryUnavailable,
    DumpFailed,
    ReplayFailed,
    CannotRemoveExisting,
    /// A staged restore produced a database that failed to open or check
    ValidationFailed,
    /// Another process holds the advisory lock on the live database
    Locked,

    // Integration/IO
    Io,
    Persistence,
    ExternalService,
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidSnapshotName => "ERR_INVALID_SNAPSHOT_NAME",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::DirectoryUnavailable => "ERR_DIRECTORY_UNAVAILABLE",
            ExErrorKind::DumpFailed => "ERR_DUMP_FAILED",
            ExErrorKind::ReplayFailed => "ERR_REPLAY_FAILED",
            ExErrorKind::CannotRemoveExisting => "ERR_CANNOT_REMOVE_EXISTING",
            ExErrorKind::ValidationFailed => "ERR_VALIDATION_FAILED",
            ExErrorKind::Locked => "ERR_LOCKED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the context
/// (operation, path, snapshot name) needed when reading logs.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    path: Option<PathBuf>,
    snapshot: Option<String>,
    run_id: Option<RunId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            snapshot: None,
            run_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add filesystem path context
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Add snapshot filename context
    pub fn with_snapshot(mut self, name: impl Into<String>) -> Self {
        self.snapshot = Some(name.into());
        self
    }

    /// Add run ID context
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(snapshot) = &self.snapshot {
            write!(f, " (snapshot: {})", snapshot)?;
        }
        if let Some(run_id) = &self.run_id {
            write!(f, " (run: {})", run_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Reasons a string is not a well-formed snapshot filename
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Snapshot name '{name}' does not end in .sql")]
    MissingSuffix { name: String },

    #[error("Snapshot name '{name}' has {found} hyphen-separated components, expected 6")]
    WrongComponentCount { name: String, found: usize },

    #[error("Snapshot name '{name}' has non-numeric component '{component}'")]
    NotNumeric { name: String, component: String },

    #[error("Snapshot name '{name}' has {field} out of range: {value}")]
    OutOfRange {
        name: String,
        field: &'static str,
        value: u32,
    },

    /// All fields in range individually but not a real calendar date (e.g. Feb 30)
    #[error("Snapshot name '{name}' is not a valid calendar date")]
    InvalidDate { name: String },
}

impl NameError {
    /// The offending name
    pub fn name(&self) -> &str {
        match self {
            NameError::MissingSuffix { name }
            | NameError::WrongComponentCount { name, .. }
            | NameError::NotNumeric { name, .. }
            | NameError::OutOfRange { name, .. }
            | NameError::InvalidDate { name } => name,
        }
    }
}

/// Failures while producing a new snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Backup directory could not be created
    #[error("Backup directory unavailable: {}: {reason}", path.display())]
    DirectoryUnavailable { path: PathBuf, reason: String },

    /// Dump tool failed; a partial file may remain at `path`
    #[error("Dump to {} failed: {reason}", path.display())]
    DumpFailed { path: PathBuf, reason: String },

    /// Live database is locked by another process
    #[error("Database {} is locked by another process", path.display())]
    Locked { path: PathBuf },
}

/// Failures while replacing the live database from a snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    /// The chosen snapshot file does not exist
    #[error("Snapshot not found: {}", path.display())]
    SnapshotMissing { path: PathBuf },

    /// The backup directory holds no valid snapshots
    #[error("No snapshots found in {}", dir.display())]
    NoSnapshots { dir: PathBuf },

    /// The requested snapshot name failed validation
    #[error(transparent)]
    InvalidName(#[from] NameError),

    /// Existing database file could not be deleted; it is left untouched
    #[error("Cannot remove existing database {}: {reason}", path.display())]
    CannotRemoveExisting { path: PathBuf, reason: String },

    /// Replay of the dump failed
    #[error("Replay of {} failed: {reason}", path.display())]
    ReplayFailed { path: PathBuf, reason: String },

    /// Staged database failed post-replay validation
    #[error("Restored database at {} failed validation: {reason}", path.display())]
    ValidationFailed { path: PathBuf, reason: String },

    /// Live database is locked by another process
    #[error("Database {} is locked by another process", path.display())]
    Locked { path: PathBuf },
}

impl From<NameError> for ExError {
    fn from(err: NameError) -> Self {
        ExError::new(ExErrorKind::InvalidSnapshotName)
            .with_op("decode_snapshot_name")
            .with_snapshot(err.name().to_string())
            .with_message(err.to_string())
    }
}

impl From<SnapshotError> for ExError {
    fn from(err: SnapshotError) -> Self {
        let message = err.to_string();
        let base = match err {
            SnapshotError::DirectoryUnavailable { path, .. } => {
                ExError::new(ExErrorKind::DirectoryUnavailable).with_path(path)
            }
            SnapshotError::DumpFailed { path, .. } => {
                ExError::new(ExErrorKind::DumpFailed).with_path(path)
            }
            SnapshotError::Locked { path } => ExError::new(ExErrorKind::Locked).with_path(path),
        };
        base.with_op("write_snapshot").with_message(message)
    }
}

impl From<RestoreError> for ExError {
    fn from(err: RestoreError) -> Self {
        let message = err.to_string();
        let base = match err {
            RestoreError::SnapshotMissing { path } => {
                ExError::new(ExErrorKind::NotFound).with_path(path)
            }
            RestoreError::NoSnapshots { dir } => ExError::new(ExErrorKind::NotFound).with_path(dir),
            RestoreError::InvalidName(name_err) => return ExError::from(name_err),
            RestoreError::CannotRemoveExisting { path, .. } => {
                ExError::new(ExErrorKind::CannotRemoveExisting).with_path(path)
            }
            RestoreError::ReplayFailed { path, .. } => {
                ExError::new(ExErrorKind::ReplayFailed).with_path(path)
            }
            RestoreError::ValidationFailed { path, .. } => {
                ExError::new(ExErrorKind::ValidationFailed).with_path(path)
            }
            RestoreError::Locked { path } => ExError::new(ExErrorKind::Locked).with_path(path),
        };
        base.with_op("restore_snapshot").with_message(message)
    }
}
