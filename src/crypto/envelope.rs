//! Encrypted envelopes: `{ "encrypted": "<base64 RSA-OAEP ciphertext>" }`.
//!
//! Opening is base64 decode, OAEP-SHA256 decrypt with the session's private
//! key, UTF-8 decode, then JSON decode into the caller's type. Each stage has
//! its own [`CryptoError`] variant so a failed open says which stage broke.

#[cfg(test)]
#[path = "envelope_test.rs"]
mod tests;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::Oaep;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;

use super::CryptoError;
use super::keys::{KeyPair, PublicKey};

/// Decrypt `ciphertext` (base64) and return the plaintext as text.
///
/// # Errors
///
/// Returns [`CryptoError::Ciphertext`] for malformed base64,
/// [`CryptoError::Decrypt`] for a wrong key or corrupted payload, and
/// [`CryptoError::Utf8`] when the plaintext is not text.
pub fn open_text(key: &KeyPair, ciphertext: &str) -> Result<String, CryptoError> {
    let bytes = STANDARD.decode(ciphertext.trim())?;
    let plain = key
        .private()
        .decrypt(Oaep::new::<Sha256>(), &bytes)
        .map_err(CryptoError::Decrypt)?;
    Ok(String::from_utf8(plain)?)
}

/// Decrypt `ciphertext` and decode the plaintext as JSON.
///
/// # Errors
///
/// Any [`open_text`] error, or [`CryptoError::Payload`] when the plaintext
/// is not JSON of type `T`.
pub fn open<T: DeserializeOwned>(key: &KeyPair, ciphertext: &str) -> Result<T, CryptoError> {
    let text = open_text(key, ciphertext)?;
    Ok(serde_json::from_str(&text)?)
}

/// Serialize `value` as JSON and seal it to `recipient`, returning base64.
///
/// A single OAEP block carries at most `modulus_bytes - 66` bytes of JSON.
///
/// # Errors
///
/// Returns [`CryptoError::Payload`] if serialization fails or
/// [`CryptoError::Encrypt`] if the JSON is too large for one block.
pub fn seal<T: Serialize + ?Sized>(recipient: &PublicKey, value: &T) -> Result<String, CryptoError> {
    let json = serde_json::to_vec(value)?;
    seal_bytes(recipient, &json)
}

/// Seal raw bytes to `recipient`, returning base64.
///
/// # Errors
///
/// Returns [`CryptoError::Encrypt`] if the payload is too large for one block.
pub fn seal_bytes(recipient: &PublicKey, plain: &[u8]) -> Result<String, CryptoError> {
    let mut rng = rand::thread_rng();
    let sealed = recipient
        .inner()
        .encrypt(&mut rng, Oaep::new::<Sha256>(), plain)
        .map_err(CryptoError::Encrypt)?;
    Ok(STANDARD.encode(sealed))
}
