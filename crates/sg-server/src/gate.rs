//! Request admission gate.
//!
//! Runs once per inbound request before any handler: rate limit first, then
//! authentication. Expected rejections are returned as
//! [`AdmissionDecision::Reject`] values; only store failures surface as
//! [`sg_core::Error`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sg_core::config::StoreFailurePolicy;
use sg_core::credential::{self, sanitize_key};
use sg_core::identity::resolve_client_identity;
use sg_core::{ClientIdentity, HeaderLookup, Result, SecretStore};

use crate::audit::Auditor;
use crate::authenticator::{extract_credential, Authenticator};
use crate::rate_limiter::RateLimiter;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    RateLimited,
    MissingCredential,
    InvalidCredential,
}

impl RejectKind {
    /// HTTP status sent to the caller.
    pub fn http_status(self) -> u16 {
        match self {
            RejectKind::RateLimited => 429,
            RejectKind::MissingCredential | RejectKind::InvalidCredential => 401,
        }
    }

    /// Machine-readable error code.
    pub fn code(self) -> &'static str {
        match self {
            RejectKind::RateLimited => "rate_limit_exceeded",
            RejectKind::MissingCredential => "missing_authentication",
            RejectKind::InvalidCredential => "invalid_authentication",
        }
    }

    /// Human-readable message.
    pub fn message(self) -> &'static str {
        match self {
            RejectKind::RateLimited => "Rate limit exceeded. Please try again later.",
            RejectKind::MissingCredential => "Authentication token required",
            RejectKind::InvalidCredential => "Invalid authentication token",
        }
    }
}

/// A rejection and the status it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectKind,
    pub http_status: u16,
}

impl From<RejectKind> for Rejection {
    fn from(kind: RejectKind) -> Self {
        Self {
            kind,
            http_status: kind.http_status(),
        }
    }
}

/// Outcome of [`AdmissionGate::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Proceed; carries the rate-limit key of the caller.
    Allow { client_id: String },
    Reject(Rejection),
}

impl AdmissionDecision {
    fn reject(kind: RejectKind) -> Self {
        AdmissionDecision::Reject(kind.into())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allow { .. })
    }
}

/// The parts of an inbound request the gate looks at.
pub struct GateRequest<'a, H: HeaderLookup> {
    pub method: &'a str,
    pub route: &'a str,
    pub headers: &'a H,
    /// Transport-layer peer address, if known.
    pub peer: Option<&'a str>,
}

/// Rate limiter and authenticator composed in order.
pub struct AdmissionGate {
    limiter: RateLimiter,
    authenticator: Authenticator,
    secrets: Arc<dyn SecretStore>,
    auditor: Auditor,
    on_store_failure: StoreFailurePolicy,
}

impl AdmissionGate {
    pub fn new(
        limiter: RateLimiter,
        secrets: Arc<dyn SecretStore>,
        auditor: Auditor,
        on_store_failure: StoreFailurePolicy,
    ) -> Self {
        Self {
            limiter,
            authenticator: Authenticator::new(secrets.clone()),
            secrets,
            auditor,
            on_store_failure,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Admit or reject a request on the current endpoints.
    pub fn admit<H: HeaderLookup>(&self, req: &GateRequest<'_, H>) -> Result<AdmissionDecision> {
        self.admit_at(req, Utc::now())
    }

    /// [`admit`](Self::admit) with an explicit clock.
    pub fn admit_at<H: HeaderLookup>(
        &self,
        req: &GateRequest<'_, H>,
        now: DateTime<Utc>,
    ) -> Result<AdmissionDecision> {
        let identity = resolve_client_identity(req.headers, req.peer);
        let client_id = identity.client_id();

        if !self.rate_check(&client_id, now)? {
            return Ok(AdmissionDecision::reject(RejectKind::RateLimited));
        }

        let Some(credential) = extract_credential(req.headers) else {
            return Ok(AdmissionDecision::reject(RejectKind::MissingCredential));
        };

        if !self.authenticator.verify(&credential)? {
            tracing::debug!(client_id = %client_id, route = req.route, "Invalid credential");
            return Ok(AdmissionDecision::reject(RejectKind::InvalidCredential));
        }

        self.audit(req, &identity);
        Ok(AdmissionDecision::Allow { client_id })
    }

    /// Admit or reject a request on a deprecated endpoint.
    ///
    /// Only `X-Api-Key` is read; a missing or wrong key is an
    /// [`RejectKind::InvalidCredential`].
    pub fn admit_legacy<H: HeaderLookup>(
        &self,
        req: &GateRequest<'_, H>,
    ) -> Result<AdmissionDecision> {
        self.admit_legacy_at(req, Utc::now())
    }

    /// [`admit_legacy`](Self::admit_legacy) with an explicit clock.
    pub fn admit_legacy_at<H: HeaderLookup>(
        &self,
        req: &GateRequest<'_, H>,
        now: DateTime<Utc>,
    ) -> Result<AdmissionDecision> {
        let identity = resolve_client_identity(req.headers, req.peer);
        let client_id = identity.client_id();

        if !self.rate_check(&client_id, now)? {
            return Ok(AdmissionDecision::reject(RejectKind::RateLimited));
        }

        if !self.authenticator.verify_legacy(req.headers)? {
            return Ok(AdmissionDecision::reject(RejectKind::InvalidCredential));
        }

        self.audit(req, &identity);
        Ok(AdmissionDecision::Allow { client_id })
    }

    /// Generate a key, store it, and return it. The old key stops working
    /// immediately.
    pub fn rotate_key(&self) -> Result<String> {
        let key = credential::generate_key();
        self.secrets.set_current_key(&key)?;
        tracing::info!("API key regenerated ({})", credential::mask_key(&key));
        Ok(key)
    }

    /// Make sure a key exists, storing `bootstrap` (sanitized) or a freshly
    /// generated one if the store is empty. Returns true when a key was written.
    pub fn ensure_key(&self, bootstrap: Option<&str>) -> Result<bool> {
        if self.secrets.get_current_key()?.is_some() {
            return Ok(false);
        }

        let key = bootstrap
            .map(sanitize_key)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(credential::generate_key);
        self.secrets.set_current_key(&key)?;
        tracing::info!("Stored initial API key ({})", credential::mask_key(&key));
        Ok(true)
    }

    /// The active key, if any.
    pub fn current_key(&self) -> Result<Option<String>> {
        self.secrets.get_current_key()
    }

    fn rate_check(&self, client_id: &str, now: DateTime<Utc>) -> Result<bool> {
        match self.limiter.check_at(client_id, now) {
            Ok(admitted) => Ok(admitted),
            Err(e)
                if e.is_store_failure() && self.on_store_failure == StoreFailurePolicy::FailOpen =>
            {
                tracing::warn!(client_id, "Rate limit store unavailable, admitting: {e}");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    fn audit<H: HeaderLookup>(&self, req: &GateRequest<'_, H>, identity: &ClientIdentity) {
        self.auditor.record(
            req.method,
            req.route,
            identity,
            req.headers.header("User-Agent"),
        );
    }
}
