//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

/// One rate-limit counter bucket.
#[derive(Debug, Clone)]
pub struct RateWindow {
    pub client_id: String,
    pub window_start: String,
    pub request_count: u32,
}

impl RateWindow {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            client_id: row.get(0)?,
            window_start: row.get(1)?,
            request_count: row.get(2)?,
        })
    }
}

/// A recorded admission.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub method: String,
    pub route: String,
    pub client_id: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub created_at: String,
}

impl AuditEntry {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            method: row.get(1)?,
            route: row.get(2)?,
            client_id: row.get(3)?,
            ip: row.get(4)?,
            user_agent: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

/// Insert payload for [`AuditEntry`].
#[derive(Debug, Clone)]
pub struct NewAuditEntry<'a> {
    pub method: &'a str,
    pub route: &'a str,
    pub client_id: &'a str,
    pub ip: &'a str,
    pub user_agent: Option<&'a str>,
}
