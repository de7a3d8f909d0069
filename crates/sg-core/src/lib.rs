//! sg-core: shared types, errors, configuration, and persistence seams.
//!
//! This crate is the foundational dependency for the other sg-* crates. It
//! provides the unified error type, application configuration, the client
//! identity resolver, API key helpers, and the counter/secret store traits
//! that the admission gate is written against.

pub mod config;
pub mod credential;
pub mod error;
pub mod identity;
pub mod store;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use identity::{ClientIdentity, HeaderLookup};
pub use store::{CounterStore, SecretStore};
