//! Route handlers for the HTTP API.

pub mod collaborator;
pub mod health;
pub mod keys;
pub mod settings;
pub mod status;
