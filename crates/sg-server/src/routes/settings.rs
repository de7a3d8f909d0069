//! Operator-adjustable rate limit.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use sg_db::pool::get_conn;
use sg_db::queries::settings;

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct RateLimitResponse {
    pub rate_limit: u32,
    /// `"setting"` when a stored override is active, else `"config"`.
    pub source: &'static str,
    pub default: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRateLimit {
    pub rate_limit: u32,
}

/// GET /synthseo/v2/settings/rate-limit
pub async fn get_rate_limit(
    State(ctx): State<AppContext>,
) -> Result<Json<RateLimitResponse>, AppError> {
    let conn = get_conn(&ctx.db)?;
    let stored = settings::get_rate_limit(&conn)?;
    Ok(Json(RateLimitResponse {
        rate_limit: ctx.gate.limiter().ceiling(),
        source: if stored.is_some() { "setting" } else { "config" },
        default: ctx.config.gate.rate_limit_per_minute,
    }))
}

/// PUT /synthseo/v2/settings/rate-limit
///
/// Stores the override and applies it from the next request on.
pub async fn put_rate_limit(
    State(ctx): State<AppContext>,
    Json(body): Json<UpdateRateLimit>,
) -> Result<Json<RateLimitResponse>, AppError> {
    if body.rate_limit == 0 {
        return Err(sg_core::Error::Validation("rate_limit must be at least 1".into()).into());
    }

    let conn = get_conn(&ctx.db)?;
    settings::set_setting(&conn, settings::RATE_LIMIT, &body.rate_limit.to_string())?;
    ctx.gate.limiter().set_ceiling(body.rate_limit);
    tracing::info!("Rate limit set to {}/min", body.rate_limit);

    Ok(Json(RateLimitResponse {
        rate_limit: body.rate_limit,
        source: "setting",
        default: ctx.config.gate.rate_limit_per_minute,
    }))
}
