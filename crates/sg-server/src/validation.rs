//! Request body validation for write routes.
//!
//! Runs after the gate. Bodies over `validation.max_request_bytes` get 413
//! `request_too_large`; a JSON body whose `content` field matches one of the
//! markup patterns below gets 400 `suspicious_content`.

use std::sync::OnceLock;

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{header, Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use regex::Regex;
use sg_core::config::ValidationConfig;
use sg_core::Error;

use crate::context::AppContext;
use crate::error::AppError;

/// Code sent when the `content` field carries active markup.
pub const SUSPICIOUS_CONTENT: &str = "suspicious_content";

const PATTERNS: &[&str] = &[
    r"(?is)<script[^>]*>.*?</script>",
    r"(?i)javascript:",
    r"(?i)vbscript:",
    r"(?i)onload\s*=",
    r"(?i)onerror\s*=",
    r"(?i)onclick\s*=",
    r"(?i)<iframe[^>]*>",
    r"(?i)<object[^>]*>",
    r"(?i)<embed[^>]*>",
];

fn patterns() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| PATTERNS.iter().filter_map(|p| Regex::new(p).ok()).collect())
}

/// True if `content` contains script-like markup.
pub fn contains_suspicious_content(content: &str) -> bool {
    patterns().iter().any(|re| re.is_match(content))
}

/// Check a buffered request body against `config`.
///
/// Bodies that are not JSON objects are only size-checked.
pub fn validate_body(config: &ValidationConfig, body: &[u8]) -> Result<(), AppError> {
    if body.len() > config.max_request_bytes {
        return Err(Error::PayloadTooLarge {
            size: body.len(),
            limit: config.max_request_bytes,
        }
        .into());
    }

    if !config.reject_suspicious_content || body.is_empty() {
        return Ok(());
    }

    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return Ok(());
    };
    let content = value.get("content").and_then(|c| c.as_str()).unwrap_or("");
    if !content.is_empty() && contains_suspicious_content(content) {
        return Err(AppError::new(Error::Validation(
            "Content contains suspicious patterns".into(),
        ))
        .with_code(SUSPICIOUS_CONTENT));
    }

    Ok(())
}

/// Validation middleware. Applied after the gate on the API routes; only
/// `POST`, `PUT` and `PATCH` bodies are inspected.
pub async fn validation_middleware(
    State(ctx): State<AppContext>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !matches!(*request.method(), Method::POST | Method::PUT | Method::PATCH) {
        return next.run(request).await;
    }

    let config = &ctx.config.validation;
    let limit = config.max_request_bytes;

    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(size) = declared.filter(|&n| n > limit) {
        return AppError::from(Error::PayloadTooLarge { size, limit }).into_response();
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, limit.saturating_add(1)).await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("Failed to buffer request body: {e}");
            return AppError::from(Error::PayloadTooLarge {
                size: limit.saturating_add(1),
                limit,
            })
            .into_response();
        }
    };

    if let Err(e) = validate_body(config, &bytes) {
        return e.into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
