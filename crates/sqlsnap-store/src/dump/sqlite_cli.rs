//! Dump and replay through the `sqlite3` command-line shell
//!
//! `sqlite3 <db> .dump > <target>` and `sqlite3 -bail <db> < <dump>`.
//! Failure is detected from the exit status; stderr is kept for the message.

use crate::dump::{Dumper, Restorer};
use crate::errors::{external_tool, io_error, Result};
use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Output, Stdio};

#[derive(Debug, Clone)]
pub struct Sqlite3Cli {
    binary: OsString,
}

impl Sqlite3Cli {
    pub fn new(binary: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for Sqlite3Cli {
    fn default() -> Self {
        Self::new("sqlite3")
    }
}

impl Dumper for Sqlite3Cli {
    fn dump(&self, db_path: &Path, target: &Path) -> Result<()> {
        // sqlite3 would silently create an empty database here
        if !db_path.is_file() {
            return Err(external_tool(
                "sqlite3_dump",
                format!("database file {} does not exist", db_path.display()),
            ));
        }

        let out = File::create(target).map_err(|e| io_error("create_dump_file", target, e))?;
        let output = Command::new(&self.binary)
            .arg(db_path)
            .arg(".dump")
            .stdin(Stdio::null())
            .stdout(out)
            .output()
            .map_err(|e| spawn_error(&self.binary, "sqlite3_dump", e))?;

        check_status("sqlite3_dump", &output)
    }
}

impl Restorer for Sqlite3Cli {
    fn replay(&self, dump: &Path, db_path: &Path) -> Result<()> {
        let input = File::open(dump).map_err(|e| io_error("open_dump_file", dump, e))?;
        let output = Command::new(&self.binary)
            .arg("-bail")
            .arg(db_path)
            .stdin(input)
            .stdout(Stdio::null())
            .output()
            .map_err(|e| spawn_error(&self.binary, "sqlite3_replay", e))?;

        check_status("sqlite3_replay", &output)
    }
}

fn spawn_error(binary: &OsString, op: &str, err: std::io::Error) -> sqlsnap_core::ExError {
    external_tool(
        op,
        format!("failed to run {}: {}", binary.to_string_lossy(), err),
    )
}

fn check_status(op: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(external_tool(
        op,
        format!("sqlite3 exited with {}: {}", output.status, stderr.trim()),
    ))
}
