//! Authenticated status endpoint.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::gate::AdmittedClient;

/// Base path of the current API.
pub const API_BASE: &str = "/synthseo/v2";

/// GET /synthseo/v2/status
pub async fn status(
    State(ctx): State<AppContext>,
    Extension(AdmittedClient(client_id)): Extension<AdmittedClient>,
) -> Result<Json<Value>, AppError> {
    let now = Utc::now();
    let limiter = ctx.gate.limiter();
    let remaining = limiter.remaining_at(&client_id, now)?;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": now.to_rfc3339(),
        "endpoints": {
            "publish": format!("{API_BASE}/publish"),
            "batch": format!("{API_BASE}/batch"),
            "media": format!("{API_BASE}/media"),
            "schema": format!("{API_BASE}/schema"),
        },
        "rate_limit": {
            "limit": limiter.ceiling(),
            "remaining": remaining,
        },
    })))
}
