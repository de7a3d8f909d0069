//! Site settings: a small name/value table.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use sg_core::{Error, Result};

/// Setting holding the active site API key.
pub const API_KEY: &str = "api_key";

/// Setting holding the operator-adjusted requests-per-minute ceiling.
pub const RATE_LIMIT: &str = "rate_limit";

/// Read a setting value.
pub fn get_setting(conn: &Connection, name: &str) -> Result<Option<String>> {
    conn.query_row("SELECT value FROM settings WHERE name = ?1", [name], |row| {
        row.get(0)
    })
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Create or replace a setting value.
pub fn set_setting(conn: &Connection, name: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (name, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        rusqlite::params![name, value, Utc::now().to_rfc3339()],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Remove a setting. Returns whether a row existed.
pub fn delete_setting(conn: &Connection, name: &str) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM settings WHERE name = ?1", [name])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// The stored rate-limit override, ignoring unparsable or zero values.
pub fn get_rate_limit(conn: &Connection) -> Result<Option<u32>> {
    Ok(get_setting(conn, RATE_LIMIT)?
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&n| n > 0))
}
