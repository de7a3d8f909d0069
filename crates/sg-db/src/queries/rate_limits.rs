//! Rate-limit window operations.
//!
//! Window timestamps are stored as `YYYY-MM-DD HH:MM:SS` UTC text, so
//! lexical comparison in SQL matches chronological order.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use sg_core::{Error, Result};

use crate::models::RateWindow;

const COLS: &str = "client_id, window_start, request_count";

/// Format a timestamp the way `window_start` is stored.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Request count for a window, `0` if the window has no row yet.
pub fn get_count(conn: &Connection, client_id: &str, window_start: DateTime<Utc>) -> Result<u32> {
    let count: Option<u32> = conn
        .query_row(
            "SELECT request_count FROM rate_limits WHERE client_id = ?1 AND window_start = ?2",
            rusqlite::params![client_id, format_timestamp(window_start)],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(count.unwrap_or(0))
}

/// Insert the window at 1 or bump it by one in a single statement.
///
/// Returns the count after the write.
pub fn upsert_increment(
    conn: &Connection,
    client_id: &str,
    window_start: DateTime<Utc>,
) -> Result<u32> {
    conn.query_row(
        "INSERT INTO rate_limits (client_id, window_start, request_count, created_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT(client_id, window_start) DO UPDATE SET
            request_count = request_count + 1
         RETURNING request_count",
        rusqlite::params![
            client_id,
            format_timestamp(window_start),
            format_timestamp(Utc::now())
        ],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Insert the window at 1 or bump it by one, but only while the count is
/// below `ceiling`. The check and the write are one statement.
///
/// Returns `None` when the window is already full.
pub fn try_increment(
    conn: &Connection,
    client_id: &str,
    window_start: DateTime<Utc>,
    ceiling: u32,
) -> Result<Option<u32>> {
    if ceiling == 0 {
        return Ok(None);
    }

    conn.query_row(
        "INSERT INTO rate_limits (client_id, window_start, request_count, created_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT(client_id, window_start) DO UPDATE SET
            request_count = request_count + 1
         WHERE request_count < ?4
         RETURNING request_count",
        rusqlite::params![
            client_id,
            format_timestamp(window_start),
            format_timestamp(Utc::now()),
            ceiling
        ],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Delete all windows that started before `cutoff`.
pub fn delete_older_than(conn: &Connection, cutoff: DateTime<Utc>) -> Result<usize> {
    conn.execute(
        "DELETE FROM rate_limits WHERE window_start < ?1",
        [format_timestamp(cutoff)],
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// All windows recorded for a client, oldest first.
pub fn list_for_client(conn: &Connection, client_id: &str) -> Result<Vec<RateWindow>> {
    let q = format!("SELECT {COLS} FROM rate_limits WHERE client_id = ?1 ORDER BY window_start");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([client_id], RateWindow::from_row)
        .map_err(|e| Error::database(e.to_string()))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Total number of stored windows.
pub fn count_windows(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM rate_limits", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}
