//! In-process logical dump and replay
//!
//! Produces the same shape of script as the `sqlite3` shell's `.dump`:
//! tables with their rows, the autoincrement counters, then indexes, views
//! and triggers, all inside one transaction. Virtual tables are rejected;
//! use [`super::Sqlite3Cli`] for databases that have them.

use crate::db::{self, quote_ident, table_exists};
use crate::dump::{Dumper, Restorer};
use crate::errors::{external_tool, from_rusqlite, io_error, Result};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDump;

impl Dumper for NativeDump {
    fn dump(&self, db_path: &Path, target: &Path) -> Result<()> {
        if !db_path.is_file() {
            return Err(external_tool(
                "native_dump",
                format!("database file {} does not exist", db_path.display()),
            ));
        }
        let conn = db::open_read_only(db_path)?;

        let file = File::create(target).map_err(|e| io_error("create_dump_file", target, e))?;
        let mut out = BufWriter::new(file);
        write_dump(&conn, &mut out).map_err(|e| e.with_path(target))?;
        out.flush()
            .map_err(|e| io_error("flush_dump_file", target, e))?;
        Ok(())
    }
}

impl Restorer for NativeDump {
    fn replay(&self, dump: &Path, db_path: &Path) -> Result<()> {
        let script =
            fs::read_to_string(dump).map_err(|e| io_error("read_dump_file", dump, e))?;
        let conn = db::open(db_path)?;
        conn.execute_batch(&script)
            .map_err(|e| from_rusqlite(e).with_op("native_replay").with_path(dump))
    }
}

/// Write a full logical dump of `conn` to `out`
///
/// Reads happen inside one read transaction so the dump is consistent.
pub fn write_dump<W: Write>(conn: &Connection, out: &mut W) -> Result<()> {
    let tx = conn.unchecked_transaction().map_err(from_rusqlite)?;

    let mut schema = tx
        .prepare(
            "SELECT type, name, sql FROM sqlite_master \
             WHERE sql IS NOT NULL AND name NOT GLOB 'sqlite_*' \
             ORDER BY rowid",
        )
        .map_err(from_rusqlite)?;
    let entries: Vec<(String, String, String)> = schema
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    drop(schema);

    put(out, b"PRAGMA foreign_keys=OFF;\nBEGIN TRANSACTION;\n")?;

    for (kind, name, sql) in entries.iter().filter(|(kind, _, _)| kind == "table") {
        if sql.trim_start().to_ascii_uppercase().starts_with("CREATE VIRTUAL") {
            return Err(external_tool(
                "native_dump",
                format!("virtual table '{}' ({}) cannot be dumped natively", name, kind),
            ));
        }
        put(out, sql.as_bytes())?;
        put(out, b";\n")?;
        dump_rows(&tx, name, out)?;
    }

    if table_exists(&tx, "sqlite_sequence")? {
        put(out, b"DELETE FROM sqlite_sequence;\n")?;
        dump_rows(&tx, "sqlite_sequence", out)?;
    }

    for (_, _, sql) in entries.iter().filter(|(kind, _, _)| kind != "table") {
        put(out, sql.as_bytes())?;
        put(out, b";\n")?;
    }

    put(out, b"COMMIT;\n")?;
    Ok(())
}

fn dump_rows<W: Write>(conn: &Connection, table: &str, out: &mut W) -> Result<()> {
    let quoted = quote_ident(table);
    let (columns, has_generated) = stored_columns(conn, table)?;
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(",");

    // Generated columns are recomputed on replay and cannot be inserted
    let insert_prefix = if has_generated {
        format!("INSERT INTO {}({}) VALUES(", quoted, column_list)
    } else {
        format!("INSERT INTO {} VALUES(", quoted)
    };

    let mut stmt = conn
        .prepare(&format!("SELECT {} FROM {}", column_list, quoted))
        .map_err(from_rusqlite)?;
    let width = stmt.column_count();
    let mut rows = stmt.query([]).map_err(from_rusqlite)?;

    while let Some(row) = rows.next().map_err(from_rusqlite)? {
        put(out, insert_prefix.as_bytes())?;
        for i in 0..width {
            if i > 0 {
                put(out, b",")?;
            }
            let value = row.get_ref(i).map_err(from_rusqlite)?;
            write_literal(out, value)?;
        }
        put(out, b");\n")?;
    }
    Ok(())
}

/// Columns that hold stored data, and whether any generated ones were skipped
///
/// `table_xinfo` reports `hidden` 2 for virtual and 3 for stored generated columns.
fn stored_columns(conn: &Connection, table: &str) -> Result<(Vec<String>, bool)> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_xinfo({})", quote_ident(table)))
        .map_err(from_rusqlite)?;
    let infos: Vec<(String, i64)> = stmt
        .query_map([], |row| Ok((row.get("name")?, row.get("hidden")?)))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    let has_generated = infos.iter().any(|(_, hidden)| matches!(hidden, 2 | 3));
    let columns = infos
        .into_iter()
        .filter(|(_, hidden)| *hidden == 0)
        .map(|(name, _)| name)
        .collect();
    Ok((columns, has_generated))
}

fn write_literal<W: Write>(out: &mut W, value: ValueRef<'_>) -> Result<()> {
    match value {
        ValueRef::Null => put(out, b"NULL"),
        ValueRef::Integer(i) => put(out, i.to_string().as_bytes()),
        ValueRef::Real(f) => put(out, real_literal(f).as_bytes()),
        ValueRef::Text(bytes) => {
            put(out, b"'")?;
            for chunk in bytes.split_inclusive(|b| *b == b'\'') {
                put(out, chunk)?;
                if chunk.last() == Some(&b'\'') {
                    put(out, b"'")?;
                }
            }
            put(out, b"'")
        }
        ValueRef::Blob(bytes) => put(out, format!("X'{}'", hex::encode_upper(bytes)).as_bytes()),
    }
}

/// Shortest text that reads back as the same f64
fn real_literal(f: f64) -> String {
    if f.is_nan() {
        "NULL".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "1e999" } else { "-1e999" }.to_string()
    } else {
        format!("{:?}", f)
    }
}

fn put<W: Write>(out: &mut W, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes).map_err(|e| {
        sqlsnap_core::ExError::new(sqlsnap_core::ExErrorKind::Io)
            .with_op("write_dump")
            .with_message(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dump_to_string(conn: &Connection) -> String {
        let mut buf = Vec::new();
        write_dump(conn, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_empty_database_dump() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(
            dump_to_string(&conn),
            "PRAGMA foreign_keys=OFF;\nBEGIN TRANSACTION;\nCOMMIT;\n"
        );
    }

    #[test]
    fn test_literals_are_escaped() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (a, b, c, d);
             INSERT INTO t VALUES ('it''s', X'00FF', 1.5, NULL);
             INSERT INTO t VALUES (-7, 'plain', 2.0, 1e300);",
        )
        .unwrap();

        let dump = dump_to_string(&conn);
        assert!(dump.contains("INSERT INTO \"t\" VALUES('it''s',X'00FF',1.5,NULL);"));
        assert!(dump.contains("INSERT INTO \"t\" VALUES(-7,'plain',2.0,1e300);"));
    }

    #[test]
    fn test_indexes_follow_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE a (x);
             CREATE INDEX a_x ON a (x);
             CREATE TABLE b (y);",
        )
        .unwrap();

        let dump = dump_to_string(&conn);
        let index_pos = dump.find("CREATE INDEX a_x").unwrap();
        let table_b_pos = dump.find("CREATE TABLE b").unwrap();
        assert!(table_b_pos < index_pos);
    }

    #[test]
    fn test_autoincrement_counter_survives() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.db");
        let dump = dir.path().join("dump.sql");
        let dst = dir.path().join("dst.db");

        {
            let conn = Connection::open(&src).unwrap();
            conn.execute_batch(
                "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, v TEXT);
                 INSERT INTO t (v) VALUES ('a'), ('b'), ('c');
                 DELETE FROM t WHERE id = 3;",
            )
            .unwrap();
        }

        NativeDump.dump(&src, &dump).unwrap();
        NativeDump.replay(&dump, &dst).unwrap();

        let conn = Connection::open(&dst).unwrap();
        conn.execute("INSERT INTO t (v) VALUES ('d')", []).unwrap();
        let id: i64 = conn
            .query_row("SELECT id FROM t WHERE v = 'd'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(id, 4);
    }

    /// Dump a database built by `setup` and replay it into a fresh file
    fn round_trip(setup: &str) -> (TempDir, Connection) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.db");
        let dump = dir.path().join("dump.sql");
        let dst = dir.path().join("dst.db");

        Connection::open(&src).unwrap().execute_batch(setup).unwrap();
        NativeDump.dump(&src, &dump).unwrap();
        NativeDump.replay(&dump, &dst).unwrap();

        let restored = Connection::open(&dst).unwrap();
        (dir, restored)
    }

    #[test]
    fn test_tables_named_like_sqlite_are_kept() {
        let (_dir, conn) = round_trip(
            "CREATE TABLE SQLiteUsers (name TEXT);
             INSERT INTO SQLiteUsers VALUES ('ada');
             CREATE TABLE sqlite3_log (line TEXT);
             INSERT INTO sqlite3_log VALUES ('boot'), ('ready');
             CREATE TABLE sqlitedata (x);
             INSERT INTO sqlitedata VALUES (1);",
        );

        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM SQLiteUsers", [], |r| r.get(0))
            .unwrap();
        let log: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite3_log", [], |r| r.get(0))
            .unwrap();
        let data: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlitedata", [], |r| r.get(0))
            .unwrap();
        assert_eq!((users, log, data), (1, 2, 1));
    }

    #[test]
    fn test_generated_columns_are_recomputed() {
        let setup = "CREATE TABLE t (
                 a INTEGER,
                 b INTEGER GENERATED ALWAYS AS (a * 2) VIRTUAL,
                 c TEXT,
                 d TEXT GENERATED ALWAYS AS (upper(c)) STORED
             );
             INSERT INTO t (a, c) VALUES (1, 'x'), (5, 'y');";
        let src = Connection::open_in_memory().unwrap();
        src.execute_batch(setup).unwrap();

        let dump = dump_to_string(&src);
        assert!(dump.contains("INSERT INTO \"t\"(\"a\",\"c\") VALUES(1,'x');"));

        let (_dir, conn) = round_trip(setup);
        let rows: Vec<(i64, i64, String, String)> = conn
            .prepare("SELECT a, b, c, d FROM t ORDER BY a")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(
            rows,
            vec![
                (1, 2, "x".to_string(), "X".to_string()),
                (5, 10, "y".to_string(), "Y".to_string()),
            ]
        );
    }

    #[test]
    fn test_real_literal_special_values() {
        assert_eq!(real_literal(f64::INFINITY), "1e999");
        assert_eq!(real_literal(f64::NEG_INFINITY), "-1e999");
        assert_eq!(real_literal(0.1), "0.1");
    }

    #[test]
    fn test_replay_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let dump = dir.path().join("bad.sql");
        fs::write(&dump, "THIS IS NOT SQL;").unwrap();

        assert!(NativeDump.replay(&dump, &dir.path().join("out.db")).is_err());
    }
}
