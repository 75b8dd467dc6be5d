//! CLI snapshot integration tests
//!
//! Drive the built binary against scratch databases. Every run uses
//! `--native` so no `sqlite3` shell is required.

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn setup_test_db(temp_dir: &TempDir) -> (PathBuf, PathBuf) {
    let db_path = temp_dir.path().join("store.db");
    let backup_dir = temp_dir.path().join("backups");

    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);
        INSERT INTO notes VALUES (1, 'first'), (2, 'second');
        "#,
    )
    .unwrap();

    (db_path, backup_dir)
}

fn sqlsnap(temp_dir: &TempDir, db: &Path, backups: &Path, args: &[&str]) -> Output {
    let cli_bin = env!("CARGO_BIN_EXE_sqlsnap");
    Command::new(cli_bin)
        .current_dir(temp_dir.path())
        .env("RUST_LOG", "off")
        .args(["--native", "--db"])
        .arg(db)
        .arg("--backup-dir")
        .arg(backups)
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn note_count(db: &Path) -> i64 {
    Connection::open(db)
        .unwrap()
        .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_cli_create_list_latest() {
    let temp_dir = TempDir::new().unwrap();
    let (db, backups) = setup_test_db(&temp_dir);

    let output = sqlsnap(&temp_dir, &db, &backups, &["snapshot", "create"]);
    assert!(
        output.status.success(),
        "create should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("Snapshot written"));

    let output = sqlsnap(&temp_dir, &db, &backups, &["snapshot", "list"]);
    assert!(output.status.success());
    let listed = String::from_utf8_lossy(&output.stdout).to_string();
    let names: Vec<&str> = listed.lines().collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with(".sql"));
    assert_eq!(names[0].len(), "YYYY-MM-DD-HH-MM-SS.sql".len());

    let output = sqlsnap(&temp_dir, &db, &backups, &["snapshot", "latest"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), names[0]);
}

#[test]
fn test_cli_restore_latest() {
    let temp_dir = TempDir::new().unwrap();
    let (db, backups) = setup_test_db(&temp_dir);

    let output = sqlsnap(&temp_dir, &db, &backups, &["snapshot", "create"]);
    assert!(output.status.success());

    let output = sqlsnap(&temp_dir, &db, &backups, &["exec", "DELETE FROM notes"]);
    assert!(output.status.success());
    assert_eq!(note_count(&db), 0);

    let output = sqlsnap(&temp_dir, &db, &backups, &["snapshot", "restore"]);
    assert!(
        output.status.success(),
        "restore should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(note_count(&db), 2);
}

#[test]
fn test_cli_restore_without_snapshots_fails() {
    let temp_dir = TempDir::new().unwrap();
    let (db, backups) = setup_test_db(&temp_dir);

    let output = sqlsnap(&temp_dir, &db, &backups, &["snapshot", "restore", "--staged"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
    assert_eq!(note_count(&db), 2);
}

#[test]
fn test_cli_restore_rejects_bad_name() {
    let temp_dir = TempDir::new().unwrap();
    let (db, backups) = setup_test_db(&temp_dir);

    let output = sqlsnap(
        &temp_dir,
        &db,
        &backups,
        &["snapshot", "restore", "--name", "2024-13-01-00-00-00.sql"],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_INVALID_SNAPSHOT_NAME"));
    assert!(db.exists());
}

#[test]
fn test_cli_load_then_query() {
    let temp_dir = TempDir::new().unwrap();
    let (db, backups) = setup_test_db(&temp_dir);
    let json_file = temp_dir.path().join("people.json");
    fs::write(
        &json_file,
        r#"[{"name": "ada", "age": 36}, {"name": "grace", "age": 85}]"#,
    )
    .unwrap();

    let output = sqlsnap(
        &temp_dir,
        &db,
        &backups,
        &["load", "people", json_file.to_str().unwrap(), "--index"],
    );
    assert!(
        output.status.success(),
        "load should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = sqlsnap(
        &temp_dir,
        &db,
        &backups,
        &["query", "SELECT name FROM people WHERE age > ?", "40"],
    );
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows, serde_json::json!([{"name": "grace"}]));

    let output = sqlsnap(
        &temp_dir,
        &db,
        &backups,
        &[
            "load",
            "people",
            json_file.to_str().unwrap(),
            "--if-exists",
            "fail",
        ],
    );
    assert!(!output.status.success());
}
