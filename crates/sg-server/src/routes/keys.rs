//! API key management.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct RegeneratedKey {
    pub api_key: String,
    pub message: &'static str,
}

/// POST /synthseo/v2/api-key/regenerate
///
/// The key used to make this call stops working as soon as it returns.
pub async fn regenerate(State(ctx): State<AppContext>) -> Result<Json<RegeneratedKey>, AppError> {
    let api_key = ctx.gate.rotate_key()?;
    Ok(Json(RegeneratedKey {
        api_key,
        message: "API key regenerated. Update your integration with the new key.",
    }))
}
