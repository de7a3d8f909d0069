//! Audit trail of admitted requests.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use sg_core::{Error, Result};

use crate::models::{AuditEntry, NewAuditEntry};
use crate::queries::rate_limits::format_timestamp;

const COLS: &str = "id, method, route, client_id, ip, user_agent, created_at";

/// Record an admission at `at`. Returns the new row id.
pub fn insert_entry(conn: &Connection, entry: &NewAuditEntry<'_>, at: DateTime<Utc>) -> Result<i64> {
    conn.execute(
        "INSERT INTO audit_log (method, route, client_id, ip, user_agent, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            entry.method,
            entry.route,
            entry.client_id,
            entry.ip,
            entry.user_agent,
            format_timestamp(at)
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(conn.last_insert_rowid())
}

/// Most recent entries, newest first.
pub fn list_recent(conn: &Connection, limit: usize) -> Result<Vec<AuditEntry>> {
    let q = format!("SELECT {COLS} FROM audit_log ORDER BY id DESC LIMIT ?1");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([limit as i64], AuditEntry::from_row)
        .map_err(|e| Error::database(e.to_string()))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Delete entries recorded before `cutoff`.
pub fn delete_older_than(conn: &Connection, cutoff: DateTime<Utc>) -> Result<usize> {
    conn.execute(
        "DELETE FROM audit_log WHERE created_at < ?1",
        [format_timestamp(cutoff)],
    )
    .map_err(|e| Error::database(e.to_string()))
}
