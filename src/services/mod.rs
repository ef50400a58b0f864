//! User-facing flows built on the API client and the session context.
//!
//! ARCHITECTURE
//! ============
//! Each flow is a free async function over `&ApiClient` plus the session.
//! Flows that change who is logged in take `&mut Session`; the rest borrow it
//! and open whatever sealed payload comes back with the session key.

pub mod auth;
pub mod dashboard;
pub mod messages;
pub mod tasks;
