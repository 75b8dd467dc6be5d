//! Logging for snapshot and data-access operations
//!
//! - [`init`] installs the process-wide subscriber for a [`Profile`]; the
//!   CLI calls it once with the profile named in `sqlsnap.toml`
//! - `log_op_start!` / `log_op_end!` / `log_op_error!` bracket each
//!   operation with events keyed by the field names in
//!   `sqlsnap_core_types::schema`
//! - [`test_capture`] records those events so tests can assert that a
//!   write or restore logged its outcome

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
