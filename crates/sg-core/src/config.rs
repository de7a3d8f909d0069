//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Default requests admitted per client per one-minute window.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 100;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gate: GateConfig,
    pub validation: ValidationConfig,
    pub maintenance: MaintenanceConfig,
    pub audit: AuditConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.gate.rate_limit_per_minute == 0 {
            warnings.push(
                "gate.rate_limit_per_minute is 0; every request will be rate limited".into(),
            );
        }

        if self.gate.on_store_failure == StoreFailurePolicy::FailOpen {
            warnings.push(
                "gate.on_store_failure is fail_open; rate limiting is skipped while the database is unavailable".into(),
            );
        }

        if let Some(ref key) = self.gate.api_key {
            if crate::credential::sanitize_key(key).len() < crate::credential::KEY_LENGTH {
                warnings.push(format!(
                    "gate.api_key is shorter than {} alphanumeric characters",
                    crate::credential::KEY_LENGTH
                ));
            }
        }

        if self.validation.max_request_bytes == 0 {
            warnings.push("validation.max_request_bytes is 0; every request body is rejected".into());
        }

        if self.maintenance.sweep_interval_secs == 0 {
            warnings.push("maintenance.sweep_interval_secs is 0; the sweep is disabled".into());
        }

        if self.audit.persist && !self.audit.enabled {
            warnings.push("audit.persist has no effect while audit.enabled is false".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            db_path: PathBuf::from("./data/synthgate.db"),
        }
    }
}

/// What the gate does when the counter store cannot be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailurePolicy {
    /// Propagate the failure; the request is answered with a 500.
    #[default]
    FailClosed,
    /// Skip the rate-limit step and log a warning.
    FailOpen,
}

/// Admission gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub rate_limit_per_minute: u32,
    pub on_store_failure: StoreFailurePolicy,
    /// Key stored on first start when the secret store is still empty.
    pub api_key: Option<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            on_store_failure: StoreFailurePolicy::default(),
            api_key: None,
        }
    }
}

/// Request body validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub max_request_bytes: usize,
    pub reject_suspicious_content: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_request_bytes: 10 * 1024 * 1024,
            reject_suspicious_content: true,
        }
    }
}

/// Periodic cleanup of rate windows and audit rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub sweep_interval_secs: u64,
    pub rate_window_retention_hours: i64,
    pub audit_retention_days: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 24 * 60 * 60,
            rate_window_retention_hours: 24,
            audit_retention_days: 7,
        }
    }
}

/// Audit trail of admitted requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub persist: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            persist: false,
        }
    }
}
