//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`sg_core::Error`] and for gate rejections
//! so handlers and middleware can return either directly. Every error body
//! has the shape `{ "code": ..., "message": ... }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::gate::Rejection;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: sg_core::Error,
    code: Option<&'static str>,
}

impl AppError {
    pub fn new(inner: sg_core::Error) -> Self {
        Self { inner, code: None }
    }

    /// Override the code derived from the error variant.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }
}

impl From<sg_core::Error> for AppError {
    fn from(e: sg_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let code = self.code.unwrap_or_else(|| self.inner.code());
        error_response(status, code, &self.inner.to_string())
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status).unwrap_or(StatusCode::UNAUTHORIZED);
        error_response(status, self.kind.code(), self.kind.message())
    }
}

/// Build a JSON error response.
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = json!({
        "code": code,
        "message": message,
        "data": { "status": status.as_u16() },
    });
    (status, axum::Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::RejectKind;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn database_error_is_500_with_code() {
        let response = AppError::new(sg_core::Error::database("locked")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], "database_error");
    }

    #[tokio::test]
    async fn code_override() {
        let err = AppError::new(sg_core::Error::Validation("bad".into())).with_code("suspicious_content");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "suspicious_content");
    }

    #[tokio::test]
    async fn rejection_bodies() {
        let cases = [
            (RejectKind::RateLimited, StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded"),
            (RejectKind::MissingCredential, StatusCode::UNAUTHORIZED, "missing_authentication"),
            (RejectKind::InvalidCredential, StatusCode::UNAUTHORIZED, "invalid_authentication"),
        ];
        for (kind, status, code) in cases {
            let response = Rejection::from(kind).into_response();
            assert_eq!(response.status(), status);
            let body = body_json(response).await;
            assert_eq!(body["code"], code);
            assert_eq!(body["message"], kind.message());
            assert_eq!(body["data"]["status"], status.as_u16());
        }
    }
}
