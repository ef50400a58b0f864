//! Client for the distributed task demo backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend hands out arithmetic tasks and relays messages between users.
//! Most of its responses are sealed to the caller's RSA public key, so every
//! flow here is the same shape: authenticate, keep the private key in the
//! session, open whatever comes back, act on it.
//!
//! Layers, bottom-up:
//! - `crypto`: PEM codec, key pairs, password digest, envelope open/seal
//! - `session`: the explicit session context plus its persistent store
//! - `net`: typed wire structs and the HTTP client for each endpoint
//! - `services`: the user-facing flows (auth, tasks, messages, dashboard)
//! - `poller` / `interp`: cancellable polling and the restricted message
//!   interpreter

pub mod config;
pub mod crypto;
pub mod error;
pub mod format;
pub mod interp;
pub mod net;
pub mod poller;
pub mod services;
pub mod session;

#[cfg(test)]
mod test_support;

pub use config::ClientConfig;
pub use error::{ClientError, ErrorCode};
pub use net::api::ApiClient;
pub use session::{Session, SessionStore};
