//! Networking modules for the task backend's JSON-over-HTTP API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` performs the HTTP calls and `types` defines the wire schema,
//! including the plain-or-sealed response wrapper.

pub mod api;
pub mod types;
