//! Routes served by the content service behind the gate.
//!
//! Publishing, post updates, media upload, batch operations and schema
//! discovery live in a downstream service. The gate still fronts them so
//! callers get consistent rate limiting and authentication; the handler
//! itself answers 501.

use axum::extract::OriginalUri;
use axum::Extension;

use crate::error::AppError;
use crate::middleware::gate::AdmittedClient;

pub async fn forward(
    OriginalUri(uri): OriginalUri,
    Extension(AdmittedClient(client_id)): Extension<AdmittedClient>,
) -> AppError {
    tracing::debug!(client_id, route = uri.path(), "No content handler mounted");
    sg_core::Error::NotImplemented(format!("{} is served by the content service", uri.path())).into()
}
