//! r2d2 pools over the gate database.
//!
//! Every request handler takes a connection for its counter upsert, so the
//! pool size bounds how many admissions hit SQLite at once. Writers queue on
//! the database lock through `busy_timeout` rather than erroring.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use sg_core::{Error, Result};

use crate::migrations;

/// How long a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT_MS: u32 = 5000;

/// Shared pool handed to the stores and the CLI.
pub type DbPool = Pool<SqliteConnectionManager>;

pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Open the gate database at `db_path`, creating and migrating it if needed.
///
/// Connections run in WAL mode so status reads never block a counter upsert,
/// and wait up to `BUSY_TIMEOUT_MS` for the write lock.
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL; PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
        ))
    });

    let pool = Pool::builder()
        .max_size(8)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {e}")))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for migrations: {e}")))?;

    migrations::run_migrations(&conn)?;

    Ok(pool)
}

/// In-memory gate database for tests.
///
/// Each call gets its own shared-cache database name, so connections of one
/// pool see the same counters and separate pools never do.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!("file:sg_memdb_{n}?mode=memory&cache=shared");

    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS));

    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create in-memory pool: {e}")))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for migrations: {e}")))?;

    migrations::run_migrations(&conn)?;

    Ok(pool)
}

/// Take a connection, mapping pool exhaustion to a database error.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {e}")))
}
