//! RSA key pairs in the backend's transport format.
//!
//! Public keys travel as SPKI DER under the `PUBLIC KEY` PEM label; private
//! keys are stored as PKCS#8 DER under `PRIVATE KEY`.

#[cfg(test)]
#[path = "keys_test.rs"]
mod tests;

use std::fmt;

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use super::CryptoError;
use super::pem;

/// Modulus size used for every generated key pair.
pub const KEY_BITS: usize = 2048;
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// An RSA key pair. The private half never leaves the client.
#[derive(Clone)]
pub struct KeyPair {
    private: RsaPrivateKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a fresh [`KEY_BITS`]-bit key pair with exponent 65537.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyGeneration`] if the RNG or prime search fails.
    pub fn generate() -> Result<Self, CryptoError> {
        Self::generate_with_bits(KEY_BITS)
    }

    /// Generate a key pair with a custom modulus size.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyGeneration`] if the RNG or prime search fails.
    pub fn generate_with_bits(bits: usize) -> Result<Self, CryptoError> {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, bits).map_err(CryptoError::KeyGeneration)?;
        Ok(Self::from_private(private))
    }

    /// Rebuild a key pair from a `PRIVATE KEY` PEM block.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM framing is wrong or the DER is not PKCS#8 RSA.
    pub fn from_private_pem(text: &str) -> Result<Self, CryptoError> {
        let der = pem::decode_labeled(text, PRIVATE_KEY_LABEL)?;
        let private = RsaPrivateKey::from_pkcs8_der(&der).map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
        Ok(Self::from_private(private))
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = PublicKey(RsaPublicKey::from(&private));
        Self { private, public }
    }

    #[must_use]
    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn private(&self) -> &RsaPrivateKey {
        &self.private
    }

    /// Export the public half as PEM text for a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyEncoding`] if SPKI encoding fails.
    pub fn public_key_pem(&self) -> Result<String, CryptoError> {
        self.public.to_pem()
    }

    /// Export the private half as PEM text for the session store.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyEncoding`] if PKCS#8 encoding fails.
    pub fn private_key_pem(&self) -> Result<String, CryptoError> {
        let der = self
            .private
            .to_pkcs8_der()
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
        Ok(pem::encode(PRIVATE_KEY_LABEL, der.as_bytes()))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private", &"<redacted>")
            .finish()
    }
}

/// The public half of a key pair, as sent to the server.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Import a `PUBLIC KEY` PEM block.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM framing is wrong or the DER is not SPKI RSA.
    pub fn from_pem(text: &str) -> Result<Self, CryptoError> {
        let der = pem::decode_labeled(text, PUBLIC_KEY_LABEL)?;
        let key = RsaPublicKey::from_public_key_der(&der).map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
        Ok(Self(key))
    }

    /// Export as `PUBLIC KEY` PEM text.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyEncoding`] if SPKI encoding fails.
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        let der = self
            .0
            .to_public_key_der()
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
        Ok(pem::encode(PUBLIC_KEY_LABEL, der.as_bytes()))
    }

    pub(crate) fn inner(&self) -> &RsaPublicKey {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use rsa::traits::PublicKeyParts;
        write!(f, "PublicKey({} bits)", self.0.size() * 8)
    }
}
