//! sg-db: database access and persistence layer.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, typed models, query modules for rate-limit windows,
//! settings and the audit log, and the SQLite implementations of the
//! gate's counter and secret stores.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;
