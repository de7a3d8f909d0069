//! Admission middleware.
//!
//! Runs [`AdmissionGate`](crate::gate::AdmissionGate) in front of the API
//! routes. Rejections short-circuit with the JSON body from
//! [`crate::error`]; admitted requests continue untouched apart from an
//! [`AdmittedClient`] extension.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, OriginalUri, State};
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{Timelike, Utc};

use crate::context::AppContext;
use crate::error::AppError;
use crate::gate::{AdmissionDecision, GateRequest, RejectKind};

/// Rate-limit key of the admitted caller, available to handlers.
#[derive(Debug, Clone)]
pub struct AdmittedClient(pub String);

/// Gate for the current API. Accepts Bearer, `X-Auth-Token` and `X-Api-Key`.
pub async fn gate_middleware(
    State(ctx): State<AppContext>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    run_gate(ctx, request, next, false).await
}

/// Gate for the deprecated API. Accepts `X-Api-Key` only.
pub async fn legacy_gate_middleware(
    State(ctx): State<AppContext>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    run_gate(ctx, request, next, true).await
}

async fn run_gate(
    ctx: AppContext,
    mut request: Request<axum::body::Body>,
    next: Next,
    legacy: bool,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let route = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let decision = {
        let req = GateRequest {
            method: request.method().as_str(),
            route: &route,
            headers: request.headers(),
            peer: peer.as_deref(),
        };
        if legacy {
            ctx.gate.admit_legacy(&req)
        } else {
            ctx.gate.admit(&req)
        }
    };

    match decision {
        Ok(AdmissionDecision::Allow { client_id }) => {
            request.extensions_mut().insert(AdmittedClient(client_id));
            next.run(request).await
        }
        Ok(AdmissionDecision::Reject(rejection)) => {
            let mut response = rejection.into_response();
            if rejection.kind == RejectKind::RateLimited {
                let retry_after = 60 - Utc::now().second();
                response
                    .headers_mut()
                    .insert("retry-after", HeaderValue::from(retry_after));
            }
            response
        }
        Err(e) => AppError::from(e).into_response(),
    }
}
