//! Requester/target identity strings.
//!
//! An identity of the form `agent:<agent-id>` references a registered agent.
//! Any other non-empty string is a direct identity (typically a human email).
//! Agent credentials carry the `agent:<id>` form as their subject, so the same
//! string flows unchanged from authentication into grant requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking an identity as a registered agent reference
pub const AGENT_IDENTITY_PREFIX: &str = "agent:";

/// Canonical identity string for an agent id
pub fn agent_identity(agent_id: &str) -> String {
    format!("{AGENT_IDENTITY_PREFIX}{agent_id}")
}

/// Parsed view of an identity string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRef<'a> {
    /// Reference to a registered agent, carrying the agent id
    Agent(&'a str),
    /// Direct identity
    Direct(&'a str),
}

impl<'a> IdentityRef<'a> {
    /// Classify an identity string
    pub fn parse(identity: &'a str) -> Self {
        match identity.strip_prefix(AGENT_IDENTITY_PREFIX) {
            Some(agent_id) if !agent_id.is_empty() => Self::Agent(agent_id),
            _ => Self::Direct(identity),
        }
    }

    /// Agent id if this identity references an agent
    pub fn agent_id(&self) -> Option<&'a str> {
        match self {
            Self::Agent(id) => Some(id),
            Self::Direct(_) => None,
        }
    }
}

/// How a caller was authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    /// Interactive session resolved by the identity collaborator
    Session,
    /// Agent presenting a credential obtained through challenge-response
    Agent,
}

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Identity string (`agent:<id>` for agents)
    pub identity: String,
    /// Authentication path
    pub kind: PrincipalKind,
}

impl Principal {
    /// A session principal
    pub fn session(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            kind: PrincipalKind::Session,
        }
    }

    /// An agent principal for the given agent id
    pub fn agent(agent_id: &str) -> Self {
        Self {
            identity: agent_identity(agent_id),
            kind: PrincipalKind::Agent,
        }
    }

    /// Whether the caller authenticated as an agent
    pub fn is_agent(&self) -> bool {
        self.kind == PrincipalKind::Agent
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity)
    }
}
