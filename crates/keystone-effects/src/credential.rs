//! Ed25519 credential handler
//!
//! Credentials are compact JWS tokens (`header.payload.signature`, each part
//! base64url without padding) signed with EdDSA. The header carries a key id
//! derived from the verifying key so a verifier can tell which key signed.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use keystone_core::effects::{CredentialEffects, CryptoError};
use keystone_core::{CredentialClaims, CredentialVerification};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const ALGORITHM: &str = "EdDSA";
const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
    kid: String,
}

/// Key id for a verifying key: first 16 hex digits of its SHA-256
pub fn key_id(key: &VerifyingKey) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..8])
}

/// Signs and verifies broker credentials with one Ed25519 key
#[derive(Debug, Clone)]
pub struct Ed25519CredentialHandler {
    issuer: String,
    signing_key: SigningKey,
    kid: String,
}

impl Ed25519CredentialHandler {
    /// Create a handler for `issuer` signing with `signing_key`
    pub fn new(issuer: impl Into<String>, signing_key: SigningKey) -> Self {
        let kid = key_id(&signing_key.verifying_key());
        Self {
            issuer: issuer.into(),
            signing_key,
            kid,
        }
    }

    /// Create a handler from a 32-byte secret key
    pub fn from_secret_bytes(issuer: impl Into<String>, secret: &[u8; 32]) -> Self {
        Self::new(issuer, SigningKey::from_bytes(secret))
    }

    /// Verifying half of the signing key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Key id placed in token headers
    pub fn kid(&self) -> &str {
        &self.kid
    }

    fn decode_claims(&self, token: &str) -> Result<CredentialClaims, String> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err("Malformed token".to_string());
        };

        let header: Header = URL_SAFE_NO_PAD
            .decode(header_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| "Malformed token header".to_string())?;
        if header.alg != ALGORITHM {
            return Err(format!("Unsupported algorithm: {}", header.alg));
        }
        if header.kid != self.kid {
            return Err("Unknown signing key".to_string());
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .ok()
            .and_then(|bytes| Signature::from_slice(&bytes).ok())
            .ok_or_else(|| "Malformed token signature".to_string())?;
        let signing_input = format!("{header_b64}.{payload_b64}");
        self.signing_key
            .verifying_key()
            .verify(signing_input.as_bytes(), &signature)
            .map_err(|_| "Invalid token signature".to_string())?;

        URL_SAFE_NO_PAD
            .decode(payload_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| "Malformed token claims".to_string())
    }
}

#[async_trait]
impl CredentialEffects for Ed25519CredentialHandler {
    fn issuer(&self) -> &str {
        &self.issuer
    }

    async fn issue_credential(&self, claims: &CredentialClaims) -> Result<String, CryptoError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
            kid: self.kid.clone(),
        };
        let header_json =
            serde_json::to_vec(&header).map_err(|e| CryptoError::Encoding(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(claims).map_err(|e| CryptoError::Encoding(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.signing_key.sign(signing_input.as_bytes());
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    async fn verify_credential(&self, token: &str, now_secs: u64) -> CredentialVerification {
        let claims = match self.decode_claims(token) {
            Ok(claims) => claims,
            Err(error) => return CredentialVerification::invalid(error),
        };
        if claims.iss != self.issuer {
            return CredentialVerification::invalid(format!("Unexpected issuer: {}", claims.iss));
        }
        if claims.exp <= now_secs {
            return CredentialVerification::invalid("Token expired");
        }
        CredentialVerification::valid(claims)
    }
}
