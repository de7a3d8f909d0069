//! Axum router construction.
//!
//! Builds the application router: the unauthenticated health probe, the
//! current API behind the admission gate, and the deprecated API behind the
//! legacy gate.

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::gate::{gate_middleware, legacy_gate_middleware};
use crate::middleware::request_id::request_id_middleware;
use crate::routes;
use crate::validation::validation_middleware;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The last route_layer is outermost, so the gate runs before validation
    // buffers the body.
    let v2 = Router::new()
        .route("/status", get(routes::status::status))
        .route("/schema", get(routes::collaborator::forward))
        .route("/publish", post(routes::collaborator::forward))
        .route("/posts", get(routes::collaborator::forward))
        .route("/posts/{id}", put(routes::collaborator::forward))
        .route("/media", post(routes::collaborator::forward))
        .route("/batch", post(routes::collaborator::forward))
        .route("/api-key/regenerate", post(routes::keys::regenerate))
        .route(
            "/settings/rate-limit",
            get(routes::settings::get_rate_limit).put(routes::settings::put_rate_limit),
        )
        .route_layer(middleware::from_fn_with_state(ctx.clone(), validation_middleware))
        .route_layer(middleware::from_fn_with_state(ctx.clone(), gate_middleware));

    let v1 = Router::new()
        .route("/publish", post(routes::collaborator::forward))
        .route("/update/{id}", put(routes::collaborator::forward))
        .route_layer(middleware::from_fn_with_state(ctx.clone(), validation_middleware))
        .route_layer(middleware::from_fn_with_state(ctx.clone(), legacy_gate_middleware));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/synthseo/v2", v2)
        .nest("/synthseo/v1", v1)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use sg_core::config::Config;
    use sg_db::pool::init_memory_pool;
    use tower::ServiceExt;

    const KEY: &str = "RouterTestKey0123456789abcdefghij";

    fn app_with(config: Config) -> Router {
        let ctx = AppContext::new(config, init_memory_pool().unwrap()).unwrap();
        ctx.gate.ensure_key(Some(KEY)).unwrap();
        build_router(ctx)
    }

    fn app() -> Router {
        app_with(Config::default())
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn status_requires_credential() {
        let response = app()
            .oneshot(Request::get("/synthseo/v2/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(response).await["code"], "missing_authentication");
    }

    #[tokio::test]
    async fn status_with_bearer() {
        let response = app()
            .oneshot(
                Request::get("/synthseo/v2/status")
                    .header("Authorization", format!("Bearer {KEY}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["endpoints"]["publish"], "/synthseo/v2/publish");
        assert_eq!(body["rate_limit"]["limit"], 100);
        assert!(body["rate_limit"]["remaining"].as_u64().unwrap() >= 99);
    }

    #[tokio::test]
    async fn collaborator_routes_answer_501_once_admitted() {
        let response = app()
            .oneshot(
                Request::put("/synthseo/v2/posts/12")
                    .header("X-Auth-Token", KEY)
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(json(response).await["code"], "not_implemented");
    }

    #[tokio::test]
    async fn gate_runs_before_validation() {
        let response = app()
            .oneshot(
                Request::post("/synthseo/v2/publish")
                    .body(Body::from(r#"{"content":"<script>x</script>"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn suspicious_content_rejected_after_admission() {
        let response = app()
            .oneshot(
                Request::post("/synthseo/v2/publish")
                    .header("X-Auth-Token", KEY)
                    .body(Body::from(r#"{"content":"<script>x</script>"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "suspicious_content");
    }

    #[tokio::test]
    async fn oversized_body_rejected() {
        let mut config = Config::default();
        config.validation.max_request_bytes = 16;
        let response = app_with(config)
            .oneshot(
                Request::post("/synthseo/v2/publish")
                    .header("X-Auth-Token", KEY)
                    .body(Body::from(vec![b'a'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json(response).await["code"], "request_too_large");
    }

    #[tokio::test]
    async fn legacy_route_rejects_bearer() {
        let response = app()
            .oneshot(
                Request::post("/synthseo/v1/publish")
                    .header("Authorization", format!("Bearer {KEY}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json(response).await["code"], "invalid_authentication");
    }

    #[tokio::test]
    async fn rate_limited_response_has_retry_after() {
        let mut config = Config::default();
        config.gate.rate_limit_per_minute = 0;
        let response = app_with(config)
            .oneshot(
                Request::get("/synthseo/v2/status")
                    .header("X-Auth-Token", KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));
        assert_eq!(json(response).await["code"], "rate_limit_exceeded");
    }
}
