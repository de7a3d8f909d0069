//! SQLite-backed implementations of the gate's store traits.

use chrono::{DateTime, Utc};
use sg_core::{CounterStore, Result, SecretStore};

use crate::pool::{get_conn, DbPool};
use crate::queries::{rate_limits, settings};

/// Counter store over the `rate_limits` table.
#[derive(Clone)]
pub struct SqliteCounterStore {
    pool: DbPool,
}

impl SqliteCounterStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CounterStore for SqliteCounterStore {
    fn get(&self, client_id: &str, window_start: DateTime<Utc>) -> Result<u32> {
        let conn = get_conn(&self.pool)?;
        rate_limits::get_count(&conn, client_id, window_start)
    }

    fn upsert_increment(&self, client_id: &str, window_start: DateTime<Utc>) -> Result<u32> {
        let conn = get_conn(&self.pool)?;
        rate_limits::upsert_increment(&conn, client_id, window_start)
    }

    fn try_increment(
        &self,
        client_id: &str,
        window_start: DateTime<Utc>,
        ceiling: u32,
    ) -> Result<Option<u32>> {
        let conn = get_conn(&self.pool)?;
        rate_limits::try_increment(&conn, client_id, window_start, ceiling)
    }

    fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = get_conn(&self.pool)?;
        rate_limits::delete_older_than(&conn, cutoff)
    }
}

/// Secret store over the `api_key` row of the `settings` table.
#[derive(Clone)]
pub struct SqliteSecretStore {
    pool: DbPool,
}

impl SqliteSecretStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SecretStore for SqliteSecretStore {
    fn get_current_key(&self) -> Result<Option<String>> {
        let conn = get_conn(&self.pool)?;
        Ok(settings::get_setting(&conn, settings::API_KEY)?.filter(|k| !k.is_empty()))
    }

    fn set_current_key(&self, key: &str) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        settings::set_setting(&conn, settings::API_KEY, key)
    }
}
