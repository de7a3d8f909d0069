//! HTTP middleware: request ID and the admission gate.

pub mod gate;
pub mod request_id;
