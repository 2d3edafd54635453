use std::path::Path;

use rusqlite::Connection;

use crate::error::{Result, StewardError};

const EVENTS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    event_id INTEGER PRIMARY KEY,
    event_type TEXT NOT NULL,
    start_date TEXT NOT NULL,
    location TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS tithes (
    id INTEGER PRIMARY KEY,
    member_id INTEGER NOT NULL,
    event_id INTEGER,
    date_paid TEXT NOT NULL,
    amount REAL NOT NULL,
    notes TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_tithes_date_paid ON tithes(date_paid);
";

/// The member table name comes from settings, so it is checked before it is
/// ever spliced into SQL.
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StewardError::InvalidTableName(name.to_string()))
    }
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection, member_table: &str) -> Result<()> {
    validate_table_name(member_table)?;
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {member_table} (
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT,
            type TEXT NOT NULL DEFAULT 'Member',
            created_at TEXT DEFAULT (datetime('now'))
        );"
    ))?;
    conn.execute_batch(EVENTS_SCHEMA)?;
    Ok(())
}

pub fn insert_member(
    conn: &Connection,
    member_table: &str,
    first_name: &str,
    last_name: &str,
    email: Option<&str>,
    member_type: &str,
) -> Result<i64> {
    validate_table_name(member_table)?;
    conn.execute(
        &format!(
            "INSERT INTO {member_table} (first_name, last_name, email, type) VALUES (?1, ?2, ?3, ?4)"
        ),
        rusqlite::params![first_name, last_name, email, member_type],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_event(
    conn: &Connection,
    event_type: &str,
    start_date: &str,
    location: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO events (event_type, start_date, location) VALUES (?1, ?2, ?3)",
        rusqlite::params![event_type, start_date, location],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_tithe(
    conn: &Connection,
    member_id: i64,
    event_id: Option<i64>,
    date_paid: &str,
    amount: f64,
    notes: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO tithes (member_id, event_id, date_paid, amount, notes) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![member_id, event_id, date_paid, amount, notes],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    validate_table_name(table)?;
    let n = conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?;
    Ok(n)
}
