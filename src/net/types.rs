//! Wire DTOs for the task backend.
//!
//! DESIGN
//! ======
//! Response types are lenient: optional fields default, unknown fields are
//! ignored, and legacy field names are accepted as aliases. Every response
//! may arrive sealed, so endpoints deserialize into [`Sealed<T>`] and let the
//! session open it.

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crypto::{CryptoError, KeyPair, envelope};

// =============================================================================
// ENVELOPE
// =============================================================================

/// A response body that is either the payload itself or an encrypted
/// envelope wrapping it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sealed<T> {
    /// `{ "encrypted": "<base64>" }`, opened with the session key.
    Encrypted { encrypted: String },
    /// The payload, unencrypted.
    Plain(T),
}

impl<T: DeserializeOwned> Sealed<T> {
    /// Unwrap with an explicit key. Plain bodies pass through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError`] when the envelope cannot be opened or its
    /// plaintext is not a `T`.
    pub fn open_with(self, key: &KeyPair) -> Result<T, CryptoError> {
        match self {
            Self::Plain(value) => Ok(value),
            Self::Encrypted { encrypted } => envelope::open(key, &encrypted),
        }
    }
}

/// FastAPI-style error body. `detail` may be a string or a validation list.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub public_key: &'a str,
}

/// Login body for both `/login` (digest + public key) and `/login-db`
/// (plaintext, no key).
#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<&'a str>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SumRequest {
    pub sum: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct CalculationRequest<'a> {
    pub calculation: &'a str,
}

#[derive(Clone, Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub to_user: &'a str,
    pub content: &'a str,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Generic `{status}` acknowledgement. Older servers answered `{msg}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StatusReply {
    #[serde(default, alias = "msg")]
    pub status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenReply {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Arithmetic operation of a task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[default]
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "/")]
    Divide,
}

impl Operation {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }

    /// Parse a single-character operator.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Subtract),
            "*" | "x" => Some(Self::Multiply),
            "/" => Some(Self::Divide),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A server-issued arithmetic task.
///
/// Legacy servers send only `{a, b}` (an addition with no identifier).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
    pub a: i64,
    pub b: i64,
    #[serde(default)]
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Acknowledgement for `/task/{id}/result` and `/result`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub task_id: Option<u64>,
    #[serde(default)]
    pub expected: Option<f64>,
    #[serde(default)]
    pub received: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CalculationReply {
    pub result: serde_json::Value,
}

/// `/get-message` payload. `message: null` means the inbox is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct MessageReply {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SessionRecord {
    pub username: String,
    #[serde(default, alias = "ip_address")]
    pub ip: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BroadcastReceipt {
    pub task_id: u64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub a: Option<i64>,
    #[serde(default)]
    pub b: Option<i64>,
    #[serde(default)]
    pub operation: Option<Operation>,
}

/// One row of `/broadcast-tasks-history`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HistoryRow {
    pub id: u64,
    pub content: String,
    #[serde(default)]
    pub a: Option<i64>,
    #[serde(default)]
    pub b: Option<i64>,
    pub operation: Operation,
    #[serde(default)]
    pub expected_result: Option<f64>,
    pub created_at: String,
    #[serde(default)]
    pub total_submissions: u64,
    #[serde(default)]
    pub correct_count: u64,
    #[serde(default)]
    pub incorrect_count: u64,
    #[serde(default)]
    pub accuracy: f64,
}
