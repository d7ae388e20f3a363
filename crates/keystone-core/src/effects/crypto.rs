//! Signature verification effects

use crate::errors::KeystoneError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cryptographic operation errors
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum CryptoError {
    /// Key material could not be parsed
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    /// Signature bytes malformed
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    /// Token encoding failed
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl From<CryptoError> for KeystoneError {
    fn from(err: CryptoError) -> Self {
        KeystoneError::crypto(err.to_string())
    }
}

/// Verification of agent signatures against enrolled public keys
#[async_trait]
pub trait SignatureEffects: Send + Sync {
    /// Verify `signature` over `message` with an enrolled public key string.
    ///
    /// Returns `Ok(false)` for a well-formed key and a signature that does not
    /// verify; returns an error when the key itself cannot be decoded.
    async fn verify_signature(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError>;

    /// Canonical form of a public key string.
    ///
    /// Two strings naming the same key material (for instance differing only
    /// in a trailing comment) map to the same value. Fails when the key
    /// cannot be decoded.
    fn canonical_public_key(&self, public_key: &str) -> Result<String, CryptoError>;
}

#[async_trait]
impl<T: SignatureEffects + ?Sized> SignatureEffects for Arc<T> {
    async fn verify_signature(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        (**self).verify_signature(public_key, message, signature).await
    }

    fn canonical_public_key(&self, public_key: &str) -> Result<String, CryptoError> {
        (**self).canonical_public_key(public_key)
    }
}
