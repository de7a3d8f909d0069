//! Periodic cleanup of expired rate windows and audit rows.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sg_db::pool::get_conn;
use sg_db::queries::audit_log;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;

/// Rows removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub rate_windows: usize,
    pub audit_entries: usize,
}

/// Delete rate windows and audit rows past their retention, relative to `now`.
pub fn run_sweep_once(ctx: &AppContext, now: DateTime<Utc>) -> sg_core::Result<SweepReport> {
    let rate_windows = ctx.gate.limiter().sweep(now)?;

    let audit_cutoff = now - chrono::Duration::days(ctx.config.maintenance.audit_retention_days);
    let conn = get_conn(&ctx.db)?;
    let audit_entries = audit_log::delete_older_than(&conn, audit_cutoff)?;

    Ok(SweepReport {
        rate_windows,
        audit_entries,
    })
}

/// Run the sweep on `maintenance.sweep_interval_secs` until cancelled.
///
/// An interval of 0 disables the task.
pub async fn run_maintenance(ctx: AppContext, cancel: CancellationToken) {
    let secs = ctx.config.maintenance.sweep_interval_secs;
    if secs == 0 {
        tracing::info!("Maintenance sweep disabled");
        return;
    }

    tracing::info!("Maintenance sweep started (every {secs}s)");
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => break,
        }

        match run_sweep_once(&ctx, Utc::now()) {
            Ok(report) => tracing::info!(
                rate_windows = report.rate_windows,
                audit_entries = report.audit_entries,
                "Maintenance sweep complete"
            ),
            Err(e) => tracing::error!("Maintenance sweep failed: {e}"),
        }
    }

    tracing::info!("Maintenance sweep stopped");
}
