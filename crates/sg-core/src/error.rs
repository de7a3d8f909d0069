//! Unified error type for the gate.
//!
//! Expected rejections (rate limit, missing or bad credentials) are not
//! errors; they are carried as admission decisions. [`Error`] covers the
//! failures that must surface as a non-2xx response on their own, and
//! [`Error::http_status`] maps each one to a status code.

/// Unified error type covering all failure modes in the gate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request body exceeds the configured limit.
    #[error("Request payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge {
        /// Observed body size in bytes.
        size: usize,
        /// Configured maximum in bytes.
        limit: usize,
    },

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The route exists but its handler is provided by a downstream service.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Unauthorized(_) => 401,
            Error::Validation(_) => 400,
            Error::PayloadTooLarge { .. } => 413,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::NotImplemented(_) => 501,
            Error::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code sent in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthorized(_) => "unauthorized",
            Error::Validation(_) => "validation_error",
            Error::PayloadTooLarge { .. } => "request_too_large",
            Error::Database { .. } => "database_error",
            Error::Io { .. } => "io_error",
            Error::NotImplemented(_) => "not_implemented",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// True for failures of the persistence layer.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Error::Database { .. })
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
