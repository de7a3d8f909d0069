//! Credential extraction and verification against the site API key.
//!
//! There is exactly one credential in the system: the key held by the
//! [`SecretStore`]. The current and legacy paths differ only in which
//! headers they read.

use std::sync::Arc;

use sg_core::credential::constant_time_eq;
use sg_core::{HeaderLookup, Result, SecretStore};

/// Header carrying a raw token for clients that cannot send `Authorization`.
pub const X_AUTH_TOKEN: &str = "X-Auth-Token";

/// Header used by legacy integrations.
pub const X_API_KEY: &str = "X-Api-Key";

/// Pull the presented credential from request headers.
///
/// Resolution order:
/// 1. `Authorization: Bearer <token>`
/// 2. `X-Auth-Token: <token>`
/// 3. `X-Api-Key: <token>` (legacy, accepted during migration)
///
/// Empty values count as absent.
pub fn extract_credential(headers: &impl HeaderLookup) -> Option<String> {
    let bearer = headers
        .header("Authorization")
        .and_then(|v| v.strip_prefix("Bearer "));

    [bearer, headers.header(X_AUTH_TOKEN), headers.header(X_API_KEY)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_owned)
}

/// Verifies credentials against the stored site key.
#[derive(Clone)]
pub struct Authenticator {
    secrets: Arc<dyn SecretStore>,
}

impl Authenticator {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    /// True iff `credential` exactly equals the stored key.
    ///
    /// With no key stored, every credential is rejected.
    pub fn verify(&self, credential: &str) -> Result<bool> {
        Ok(self
            .secrets
            .get_current_key()?
            .is_some_and(|stored| constant_time_eq(credential, &stored)))
    }

    /// Legacy check: reads only `X-Api-Key` and never errors on absence.
    ///
    /// The value is trimmed the same way [`extract_credential`] trims.
    pub fn verify_legacy(&self, headers: &impl HeaderLookup) -> Result<bool> {
        let Some(presented) = headers
            .header(X_API_KEY)
            .map(str::trim)
            .filter(|v| !v.is_empty())
        else {
            return Ok(false);
        };
        Ok(self
            .secrets
            .get_current_key()?
            .is_some_and(|stored| constant_time_eq(presented, &stored)))
    }
}
