//! Canonical field keys and event names for structured logging
//!
//! Field keys double as tracing field identifiers in the logging macros, so
//! they must stay valid Rust identifiers.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";

// Snapshot lifecycle
pub const FIELD_SNAPSHOT: &str = "snapshot";
pub const FIELD_DB_PATH: &str = "db_path";
pub const FIELD_BACKUP_DIR: &str = "backup_dir";

// Data access
pub const FIELD_TABLE: &str = "table";
pub const FIELD_ROW_COUNT: &str = "row_count";

pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

/// Values of the `event` field
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
