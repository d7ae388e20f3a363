//! Grant records
//!
//! A grant is created `pending`, leaves `pending` exactly once (to `approved`
//! or `denied`), and an approved grant may later become `used` (one-shot
//! grants only) or `revoked`. `denied`, `used` and `revoked` are terminal.

use crate::time::MILLIS_PER_SECOND;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reuse semantics of a grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantType {
    /// Valid for exactly one successful use
    Once,
    /// Valid for a bounded duration once approved
    Timed,
    /// Valid until explicitly revoked
    Always,
}

impl GrantType {
    /// Every accepted grant type, in wire order
    pub const ALL: [GrantType; 3] = [GrantType::Once, GrantType::Timed, GrantType::Always];

    /// Wire name of the grant type
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Once => "once",
            GrantType::Timed => "timed",
            GrantType::Always => "always",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GrantType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown grant type: {s}"))
    }
}

/// Lifecycle status of a grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    /// Awaiting a decision
    Pending,
    /// Approved and redeemable
    Approved,
    /// Rejected by an approver
    Denied,
    /// One-shot grant already redeemed
    Used,
    /// Withdrawn after approval
    Revoked,
}

impl GrantStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantStatus::Pending => "pending",
            GrantStatus::Approved => "approved",
            GrantStatus::Denied => "denied",
            GrantStatus::Used => "used",
            GrantStatus::Revoked => "revoked",
        }
    }

    /// Whether no further transition is accepted from this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GrantStatus::Denied | GrantStatus::Used | GrantStatus::Revoked
        )
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grant request as received from a caller, before validation.
///
/// Every field is optional and the grant type is still a raw string so that
/// missing or unknown values surface as `InvalidRequest` from the validator
/// instead of as deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequestInput {
    /// Identity asking for permission
    #[serde(default)]
    pub requester: Option<String>,
    /// Identity acted upon
    #[serde(default)]
    pub target: Option<String>,
    /// Requested grant type (`once`, `timed`, `always`)
    #[serde(default)]
    pub grant_type: Option<String>,
    /// Window length in seconds, required for timed grants
    #[serde(default)]
    pub duration: Option<u64>,
}

/// Validated grant request embedded in every grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    /// Identity asking for permission
    pub requester: String,
    /// Identity acted upon
    pub target: String,
    /// Reuse semantics
    pub grant_type: GrantType,
    /// Window length in seconds; present iff `grant_type` is `timed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

/// Authorization record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Unique grant id
    pub id: String,
    /// The request this grant answers
    pub request: GrantRequest,
    /// Current status
    pub status: GrantStatus,
    /// Creation time (Unix ms)
    pub created_at: u64,
    /// Identity that approved or denied the grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    /// Decision time (Unix ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<u64>,
    /// Redemption time of a one-shot grant (Unix ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<u64>,
}

impl Grant {
    /// A fresh pending grant
    pub fn pending(id: impl Into<String>, request: GrantRequest, created_at: u64) -> Self {
        Self {
            id: id.into(),
            request,
            status: GrantStatus::Pending,
            created_at,
            decided_by: None,
            decided_at: None,
            used_at: None,
        }
    }

    /// Requester identity
    pub fn requester(&self) -> &str {
        &self.request.requester
    }

    /// Target identity
    pub fn target(&self) -> &str {
        &self.request.target
    }

    /// Grant type
    pub fn grant_type(&self) -> GrantType {
        self.request.grant_type
    }

    /// End of the redemption window (Unix ms) for an approved timed grant
    pub fn window_end_ms(&self) -> Option<u64> {
        match (self.request.grant_type, self.decided_at, self.request.duration) {
            (GrantType::Timed, Some(decided_at), Some(duration)) => {
                Some(decided_at.saturating_add(duration.saturating_mul(MILLIS_PER_SECOND)))
            }
            _ => None,
        }
    }

    /// Apply a status change together with its causal metadata
    pub fn apply_update(&mut self, status: GrantStatus, update: &GrantUpdate) {
        self.status = status;
        if let Some(decided_by) = &update.decided_by {
            self.decided_by = Some(decided_by.clone());
        }
        if let Some(decided_at) = update.decided_at {
            self.decided_at = Some(decided_at);
        }
        if let Some(used_at) = update.used_at {
            self.used_at = Some(used_at);
        }
    }
}

/// Metadata merged into a grant alongside a status change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantUpdate {
    /// Deciding identity
    pub decided_by: Option<String>,
    /// Decision time (Unix ms)
    pub decided_at: Option<u64>,
    /// Redemption time (Unix ms)
    pub used_at: Option<u64>,
}

impl GrantUpdate {
    /// Decision metadata
    pub fn decision(decided_by: impl Into<String>, decided_at: u64) -> Self {
        Self {
            decided_by: Some(decided_by.into()),
            decided_at: Some(decided_at),
            used_at: None,
        }
    }

    /// Redemption metadata
    pub fn used(used_at: u64) -> Self {
        Self {
            used_at: Some(used_at),
            ..Self::default()
        }
    }
}

/// Listing query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantFilter {
    /// Restrict to one requester; bypasses caller-based visibility. Blank is
    /// treated as no restriction
    #[serde(default)]
    pub requester: Option<String>,
}
