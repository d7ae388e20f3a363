//! Ed25519 signature handler
//!
//! Enrolled agent keys use the OpenSSH public key line format:
//! `ssh-ed25519 <base64 wire blob> [comment]`, where the blob is the
//! length-prefixed key type followed by the length-prefixed 32-byte key.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH};
use keystone_core::effects::{CryptoError, SignatureEffects};

/// OpenSSH key type name for Ed25519
pub const SSH_ED25519_KEY_TYPE: &str = "ssh-ed25519";

fn read_field<'a>(blob: &mut &'a [u8]) -> Result<&'a [u8], CryptoError> {
    if blob.len() < 4 {
        return Err(CryptoError::InvalidKey("truncated key blob".to_string()));
    }
    let (len_bytes, rest) = blob.split_at(4);
    let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    if rest.len() < len {
        return Err(CryptoError::InvalidKey("truncated key blob".to_string()));
    }
    let (field, rest) = rest.split_at(len);
    *blob = rest;
    Ok(field)
}

/// Parse an `ssh-ed25519` public key line
pub fn parse_ssh_ed25519(public_key: &str) -> Result<VerifyingKey, CryptoError> {
    let mut parts = public_key.split_whitespace();
    let (Some(key_type), Some(encoded)) = (parts.next(), parts.next()) else {
        return Err(CryptoError::InvalidKey(
            "expected `ssh-ed25519 <base64>`".to_string(),
        ));
    };
    if key_type != SSH_ED25519_KEY_TYPE {
        return Err(CryptoError::InvalidKey(format!(
            "unsupported key type {key_type}"
        )));
    }

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| CryptoError::InvalidKey(format!("invalid base64: {e}")))?;
    let mut blob = decoded.as_slice();

    if read_field(&mut blob)? != SSH_ED25519_KEY_TYPE.as_bytes() {
        return Err(CryptoError::InvalidKey(
            "key blob type does not match key line".to_string(),
        ));
    }
    let key_bytes: [u8; PUBLIC_KEY_LENGTH] = read_field(&mut blob)?
        .try_into()
        .map_err(|_| CryptoError::InvalidKey("ed25519 key must be 32 bytes".to_string()))?;
    if !blob.is_empty() {
        return Err(CryptoError::InvalidKey("trailing bytes in key blob".to_string()));
    }

    VerifyingKey::from_bytes(&key_bytes).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Render a verifying key as an `ssh-ed25519` public key line
pub fn encode_ssh_ed25519(key: &VerifyingKey) -> String {
    let mut blob = Vec::with_capacity(4 + SSH_ED25519_KEY_TYPE.len() + 4 + PUBLIC_KEY_LENGTH);
    blob.extend_from_slice(&(SSH_ED25519_KEY_TYPE.len() as u32).to_be_bytes());
    blob.extend_from_slice(SSH_ED25519_KEY_TYPE.as_bytes());
    blob.extend_from_slice(&(PUBLIC_KEY_LENGTH as u32).to_be_bytes());
    blob.extend_from_slice(key.as_bytes());
    format!("{SSH_ED25519_KEY_TYPE} {}", STANDARD.encode(blob))
}

/// Signature verification against `ssh-ed25519` keys
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519SignatureHandler;

impl Ed25519SignatureHandler {
    /// Create a new signature handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignatureEffects for Ed25519SignatureHandler {
    async fn verify_signature(
        &self,
        public_key: &str,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        let key = parse_ssh_ed25519(public_key)?;
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(key.verify(message, &signature).is_ok())
    }

    fn canonical_public_key(&self, public_key: &str) -> Result<String, CryptoError> {
        parse_ssh_ed25519(public_key).map(|key| encode_ssh_ed25519(&key))
    }
}
