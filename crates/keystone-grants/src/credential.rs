//! Authz credential results

use keystone_core::time::MILLIS_PER_SECOND;
use keystone_core::{CredentialClaims, Grant, GrantType, KeystoneError};
use serde::{Deserialize, Serialize};

/// A grant together with an authz credential issued for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantCredential {
    /// The approved grant
    pub grant: Grant,
    /// Signed bearer credential
    pub token: String,
    /// Credential expiry (Unix seconds)
    pub expires_at: u64,
}

/// Result of verifying a presented authz credential.
///
/// Rejections are reported in-band so callers can relay the reason; only
/// infrastructure failures surface as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Whether the credential is accepted
    pub valid: bool,
    /// Verified claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<CredentialClaims>,
    /// Grant state after verification (`used` for a redeemed once grant)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant: Option<Grant>,
    /// Rejection reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationOutcome {
    /// Accepted credential
    pub fn accepted(claims: CredentialClaims, grant: Grant) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            grant: Some(grant),
            error: None,
        }
    }

    /// Rejected credential
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            claims: None,
            grant: None,
            error: Some(error.into()),
        }
    }

    /// Rejection carrying a lifecycle error's message
    pub(crate) fn from_lifecycle_error(err: &KeystoneError) -> Self {
        match err {
            KeystoneError::Expired { message } => Self::rejected(message.clone()),
            other => Self::rejected(other.to_string()),
        }
    }
}

/// Expiry (Unix seconds) of an authz credential issued at `iat`.
///
/// Timed credentials never outlive the grant window.
pub fn authz_expiry(grant: &Grant, iat: u64, ttl_secs: u64) -> u64 {
    let exp = iat.saturating_add(ttl_secs);
    match (grant.grant_type(), grant.window_end_ms()) {
        (GrantType::Timed, Some(end_ms)) => exp.min(end_ms / MILLIS_PER_SECOND),
        _ => exp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::{GrantRequest, GrantStatus, GrantUpdate};

    fn approved(grant_type: GrantType, duration: Option<u64>) -> Grant {
        let mut g = Grant::pending(
            "g1",
            GrantRequest {
                requester: "agent:a1".to_string(),
                target: "bob@x".to_string(),
                grant_type,
                duration,
            },
            0,
        );
        g.apply_update(GrantStatus::Approved, &GrantUpdate::decision("carol@x", 100_000));
        g
    }

    #[test]
    fn timed_credentials_end_with_the_window() {
        let g = approved(GrantType::Timed, Some(60));
        assert_eq!(authz_expiry(&g, 100, 3600), 160);
        assert_eq!(authz_expiry(&g, 100, 30), 130);
    }

    #[test]
    fn other_credentials_use_the_ttl() {
        let g = approved(GrantType::Always, None);
        assert_eq!(authz_expiry(&g, 100, 3600), 3700);
    }
}
