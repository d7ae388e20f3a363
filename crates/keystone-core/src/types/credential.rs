//! Claims carried by broker-issued credentials

use crate::types::grant::{Grant, GrantType};
use serde::{Deserialize, Serialize};

/// Which kind of credential a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    /// Asserts an approved grant
    Authz,
    /// Asserts an authenticated agent
    Agent,
}

/// Claim set shared by authz and agent credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Issuer
    pub iss: String,
    /// Subject: the requester for authz credentials, `agent:<id>` for agent credentials
    pub sub: String,
    /// Audience: the grant target for authz credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expires at (Unix seconds)
    pub exp: u64,
    /// Credential kind
    pub kind: CredentialKind,
    /// Grant asserted by an authz credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_id: Option<String>,
    /// Type of the asserted grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_type: Option<GrantType>,
}

impl CredentialClaims {
    /// Claims for an authz credential over `grant`
    pub fn authz(grant: &Grant, issuer: impl Into<String>, iat: u64, exp: u64) -> Self {
        Self {
            iss: issuer.into(),
            sub: grant.request.requester.clone(),
            aud: Some(grant.request.target.clone()),
            iat,
            exp,
            kind: CredentialKind::Authz,
            grant_id: Some(grant.id.clone()),
            grant_type: Some(grant.request.grant_type),
        }
    }

    /// Claims for an agent credential
    pub fn agent(subject: impl Into<String>, issuer: impl Into<String>, iat: u64, exp: u64) -> Self {
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            aud: None,
            iat,
            exp,
            kind: CredentialKind::Agent,
            grant_id: None,
            grant_type: None,
        }
    }
}

/// Outcome of credential verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialVerification {
    /// Whether signature, issuer and expiry all checked out
    pub valid: bool,
    /// Decoded claims when valid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<CredentialClaims>,
    /// Reason when invalid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CredentialVerification {
    /// A successful verification
    pub fn valid(claims: CredentialClaims) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            error: None,
        }
    }

    /// A failed verification
    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            claims: None,
            error: Some(error.into()),
        }
    }
}
