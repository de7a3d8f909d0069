//! Best-effort audit trail of admitted requests.
//!
//! Entries go to the `synthgate::audit` tracing target and, optionally, the
//! `audit_log` table. Nothing here can fail an admission: storage errors are
//! logged at debug level and dropped.

use chrono::Utc;
use sg_core::config::AuditConfig;
use sg_core::ClientIdentity;
use sg_db::models::NewAuditEntry;
use sg_db::pool::{get_conn, DbPool};
use sg_db::queries::audit_log;

/// Records admissions according to [`AuditConfig`].
#[derive(Clone)]
pub struct Auditor {
    config: AuditConfig,
    db: Option<DbPool>,
}

impl Auditor {
    /// Build an auditor. `db` is only used when `config.persist` is set.
    pub fn new(config: AuditConfig, db: Option<DbPool>) -> Self {
        Self { config, db }
    }

    /// An auditor that records nothing.
    pub fn disabled() -> Self {
        Self {
            config: AuditConfig {
                enabled: false,
                persist: false,
            },
            db: None,
        }
    }

    /// Record one admitted request.
    pub fn record(
        &self,
        method: &str,
        route: &str,
        identity: &ClientIdentity,
        user_agent: Option<&str>,
    ) {
        if !self.config.enabled {
            return;
        }

        let client_id = identity.client_id();
        tracing::info!(
            target: "synthgate::audit",
            method,
            route,
            client_id = %client_id,
            ip = %identity.raw_ip,
            user_agent = user_agent.unwrap_or(""),
            timestamp = %Utc::now().to_rfc3339(),
            "API request admitted"
        );

        if !self.config.persist {
            return;
        }
        let Some(ref db) = self.db else {
            return;
        };

        let entry = NewAuditEntry {
            method,
            route,
            client_id: &client_id,
            ip: &identity.raw_ip,
            user_agent,
        };
        let result = get_conn(db).and_then(|conn| audit_log::insert_entry(&conn, &entry, Utc::now()));
        if let Err(e) = result {
            tracing::debug!("Failed to persist audit entry: {e}");
        }
    }
}
