//! Database query modules.

pub mod audit_log;
pub mod rate_limits;
pub mod settings;
