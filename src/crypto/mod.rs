//! Session crypto: the only material exchanged with the backend that is not
//! plain JSON.
//!
//! DESIGN
//! ======
//! Every operation is a stateless transform over its inputs. Key material
//! lives in the caller's [`crate::session::Session`]; nothing here caches or
//! stores keys.
//!
//! Algorithms are fixed by the backend: RSA-2048, OAEP with SHA-256 for both
//! the digest and MGF1, SPKI/PKCS#8 DER inside PEM, and an unsalted SHA-256
//! password digest.

pub mod envelope;
pub mod keys;
pub mod password;
pub mod pem;

pub use keys::{KeyPair, PublicKey};
pub use password::digest_password;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by crypto operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// PEM framing or base64 body could not be decoded.
    #[error(transparent)]
    Pem(#[from] pem::PemError),

    /// RSA key generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(rsa::Error),

    /// DER encoding or decoding of a key failed.
    #[error("key encoding failed: {0}")]
    KeyEncoding(String),

    /// Envelope ciphertext is not valid base64.
    #[error("ciphertext is not valid base64: {0}")]
    Ciphertext(#[from] base64::DecodeError),

    /// RSA-OAEP decryption failed (wrong key or corrupted payload).
    #[error("decryption failed: {0}")]
    Decrypt(rsa::Error),

    /// RSA-OAEP encryption failed (payload too large for the modulus).
    #[error("encryption failed: {0}")]
    Encrypt(rsa::Error),

    /// Decrypted bytes are not UTF-8 text.
    #[error("decrypted payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Decrypted text is not the expected JSON shape.
    #[error("decrypted payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}
