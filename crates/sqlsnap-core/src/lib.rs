//! sqlsnap Core - snapshot naming, errors, logging and configuration
//!
//! This crate holds the pieces of the snapshot lifecycle that do not touch
//! SQLite:
//!
//! - `naming`: the sortable `YYYY-MM-DD-HH-MM-SS.sql` filename codec
//! - `errors`: typed errors per concern plus the structured `ExError` facility
//! - `logging_facility`: tracing initialization, canonical macros, test capture
//! - `config`: TOML configuration shared by the store and the CLI

pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod naming;

pub use errors::{ExError, ExErrorKind, NameError, RestoreError, Result, SnapshotError};
pub use naming::{decode, encode, SnapshotInstant, SnapshotName, SNAPSHOT_SUFFIX};

// Used by the logging macros
#[doc(hidden)]
pub use sqlsnap_core_types as __types;
#[doc(hidden)]
pub use tracing as __tracing;
