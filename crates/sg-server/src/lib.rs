//! sg-server: admission gate, HTTP API, and background maintenance.
//!
//! This crate ties sg-core and sg-db together into a running server:
//!
//! - Fixed-window rate limiter and API-key authenticator composed into the
//!   [`gate::AdmissionGate`]
//! - Axum router with the gate as middleware on every API route
//! - Request body validation on write routes
//! - Periodic sweep of expired rate windows and audit rows
//! - Graceful shutdown via signal handling

pub mod audit;
pub mod authenticator;
pub mod context;
pub mod error;
pub mod gate;
pub mod maintenance;
pub mod middleware;
pub mod rate_limiter;
pub mod router;
pub mod routes;
pub mod validation;

use std::net::SocketAddr;

use sg_core::config::Config;
use sg_core::credential::mask_key;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;

/// Open (or create) the database named in `config` and build the context.
pub fn open_context(config: Config) -> sg_core::Result<AppContext> {
    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }

    let db_str = db_path.to_string_lossy().into_owned();
    let db = sg_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    AppContext::new(config, db)
}

/// Start the gate server.
///
/// Initializes the database, makes sure an API key exists, spawns the
/// maintenance sweep, and serves HTTP until a shutdown signal arrives.
pub async fn start(config: Config) -> sg_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| sg_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = open_context(config)?;

    if ctx.gate.ensure_key(ctx.config.gate.api_key.as_deref())? {
        tracing::info!("No API key was stored; run `synthgate show-api-key --reveal` to read it");
    } else if let Some(key) = ctx.gate.current_key()? {
        tracing::info!("API key loaded ({})", mask_key(&key));
    }

    tracing::info!(
        "Rate limit: {}/min per client",
        ctx.gate.limiter().ceiling()
    );

    let cancel = CancellationToken::new();

    let maintenance_ctx = ctx.clone();
    let maintenance_cancel = cancel.clone();
    let maintenance_handle = tokio::spawn(async move {
        maintenance::run_maintenance(maintenance_ctx, maintenance_cancel).await;
    });

    let app = router::build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| sg_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Starting server on {addr}");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(cancel.clone()))
    .await;

    cancel.cancel();
    let _ = maintenance_handle.await;

    served.map_err(|e| sg_core::Error::Internal(format!("Server error: {e}")))?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM) or cancellation.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_context_creates_database_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.db_path = dir.path().join("nested").join("gate.db");

        let ctx = open_context(config).unwrap();
        assert!(dir.path().join("nested").join("gate.db").exists());
        assert!(ctx.gate.current_key().unwrap().is_none());
    }
}
