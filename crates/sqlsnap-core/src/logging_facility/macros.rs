//! Operation lifecycle macros
//!
//! A snapshot write, a restore or a data-access call is bracketed by one
//! `start` event and exactly one `end` or `end_error` event, all carrying the
//! same `op` (`write_snapshot`, `restore_snapshot`, ...) and the emitting
//! module as `component`. Extra fields such as `snapshot`, `db_path` or
//! `backup_dir` pass straight through to `tracing`.
//!
//! The macros resolve `tracing` and the schema constants through this crate,
//! so callers only need a dependency on `sqlsnap-core`.

#[doc(hidden)]
#[macro_export]
macro_rules! __op_event {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        $crate::__tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// Emit the `start` event of `op`
///
/// ```
/// # use sqlsnap_core::log_op_start;
/// log_op_start!("write_snapshot");
/// log_op_start!("write_snapshot", backup_dir = "data/backups", db_path = "data/store.db");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__op_event!(
            info,
            $op,
            $crate::__types::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// Emit the `end` event of `op`; `duration_ms` is mandatory
///
/// ```
/// # use sqlsnap_core::log_op_end;
/// log_op_end!("restore_snapshot", duration_ms = 42, snapshot = "2024-03-05-14-30-00.sql");
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__op_event!(
            info,
            $op,
            $crate::__types::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Emit the `end_error` event of `op`
///
/// Anything convertible into `ExError` is accepted; its kind and stable code
/// are logged as `err_kind` and `err_code`.
///
/// ```
/// # use sqlsnap_core::{log_op_error, errors::SnapshotError};
/// let err = SnapshotError::Locked { path: "store.db".into() };
/// log_op_error!("write_snapshot", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__op_event!(
            error,
            $op,
            $crate::__types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            error = %ex_err
            $(, $($field)*)?
        )
    }};
}
