//! Application context shared by all route handlers via Axum state.

use std::sync::Arc;

use sg_core::config::Config;
use sg_db::pool::{get_conn, DbPool};
use sg_db::queries::settings;
use sg_db::store::{SqliteCounterStore, SqliteSecretStore};

use crate::audit::Auditor;
use crate::gate::AdmissionGate;
use crate::rate_limiter::RateLimiter;

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s and the pool.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// The admission gate in front of every API route.
    pub gate: Arc<AdmissionGate>,
}

impl AppContext {
    /// Wire the SQLite stores into a gate.
    ///
    /// The ceiling comes from the `rate_limit` setting when one is stored,
    /// otherwise from `gate.rate_limit_per_minute`.
    pub fn new(config: Config, db: DbPool) -> sg_core::Result<Self> {
        let stored = {
            let conn = get_conn(&db)?;
            settings::get_rate_limit(&conn)?
        };
        let ceiling = stored.unwrap_or(config.gate.rate_limit_per_minute);
        if stored.is_some() {
            tracing::info!("Using stored rate limit of {ceiling}/min");
        }

        let limiter = RateLimiter::new(
            Arc::new(SqliteCounterStore::new(db.clone())),
            ceiling,
            chrono::Duration::hours(config.maintenance.rate_window_retention_hours),
        );
        let auditor = Auditor::new(config.audit.clone(), Some(db.clone()));
        let gate = AdmissionGate::new(
            limiter,
            Arc::new(SqliteSecretStore::new(db.clone())),
            auditor,
            config.gate.on_store_failure,
        );

        Ok(Self {
            db,
            config: Arc::new(config),
            gate: Arc::new(gate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_db::pool::init_memory_pool;

    #[test]
    fn configured_ceiling_by_default() {
        let mut config = Config::default();
        config.gate.rate_limit_per_minute = 42;
        let ctx = AppContext::new(config, init_memory_pool().unwrap()).unwrap();
        assert_eq!(ctx.gate.limiter().ceiling(), 42);
    }

    #[test]
    fn stored_setting_overrides_config() {
        let db = init_memory_pool().unwrap();
        settings::set_setting(&db.get().unwrap(), settings::RATE_LIMIT, "7").unwrap();
        let ctx = AppContext::new(Config::default(), db).unwrap();
        assert_eq!(ctx.gate.limiter().ceiling(), 7);
    }
}
