//! Password digest sent in place of the plaintext password.
//!
//! This is a single unsalted SHA-256, which the backend compares directly.
//! It hides the password from casual logging and nothing more: equal
//! passwords give equal digests and the digest is replayable as a credential.

#[cfg(test)]
#[path = "password_test.rs"]
mod tests;

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `password`'s UTF-8 bytes.
#[must_use]
pub fn digest_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    let bytes = hasher.finalize();
    bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
}
