//! Credential signing and verification effects
//!
//! The signing collaborator owns key material and token format. The broker
//! hands it claims and gets back an opaque bearer string, and later asks it
//! to turn a presented string back into verified claims.

use crate::effects::crypto::CryptoError;
use crate::types::{CredentialClaims, CredentialVerification};
use async_trait::async_trait;
use std::sync::Arc;

/// Issue and verify signed, time-bound credentials
#[async_trait]
pub trait CredentialEffects: Send + Sync {
    /// Issuer name stamped into every credential
    fn issuer(&self) -> &str;

    /// Sign `claims` into a bearer token
    async fn issue_credential(&self, claims: &CredentialClaims) -> Result<String, CryptoError>;

    /// Verify signature, issuer and expiry of `token` at `now_secs`
    async fn verify_credential(&self, token: &str, now_secs: u64) -> CredentialVerification;
}

#[async_trait]
impl<T: CredentialEffects + ?Sized> CredentialEffects for Arc<T> {
    fn issuer(&self) -> &str {
        (**self).issuer()
    }

    async fn issue_credential(&self, claims: &CredentialClaims) -> Result<String, CryptoError> {
        (**self).issue_credential(claims).await
    }

    async fn verify_credential(&self, token: &str, now_secs: u64) -> CredentialVerification {
        (**self).verify_credential(token, now_secs).await
    }
}
