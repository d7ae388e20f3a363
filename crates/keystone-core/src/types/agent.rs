//! Agent records
//!
//! Agents are owned by the identity collaborator; the broker reads them to
//! resolve approvers and verify challenge signatures, and writes them only
//! through enrollment and deactivation.

use crate::types::identity::agent_identity;
use serde::{Deserialize, Serialize};

/// A registered non-human principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent id
    pub id: String,
    /// Unique email, if the agent has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name
    pub name: String,
    /// Signature verification key (`ssh-ed25519 <base64>`)
    pub public_key: String,
    /// Owning identity
    pub owner: String,
    /// Identity entitled to decide this agent's grants
    pub approver: String,
    /// Enrollment time (Unix ms)
    pub created_at: u64,
    /// Inactive agents cannot authenticate
    pub is_active: bool,
}

impl Agent {
    /// Canonical identity string (`agent:<id>`)
    pub fn identity(&self) -> String {
        agent_identity(&self.id)
    }
}

/// Enrollment fields supplied by an admin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentEnrollment {
    /// Requested id; a random UUID is assigned when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Optional unique email
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Public key in `ssh-ed25519 <base64>` form
    #[serde(default)]
    pub public_key: Option<String>,
    /// Owner; defaults to the enrolling admin
    #[serde(default)]
    pub owner: Option<String>,
    /// Approver; defaults to the enrolling admin
    #[serde(default)]
    pub approver: Option<String>,
}

/// Externally visible agent state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Agent may authenticate
    Active,
    /// Agent has been deactivated
    Inactive,
}

/// Result of a successful enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledAgent {
    /// Assigned agent id
    pub agent_id: String,
    /// Agent email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name
    pub name: String,
    /// Owner identity
    pub owner: String,
    /// Approver identity
    pub approver: String,
    /// Always `active` for a fresh enrollment
    pub status: AgentStatus,
}

impl From<&Agent> for EnrolledAgent {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.id.clone(),
            email: agent.email.clone(),
            name: agent.name.clone(),
            owner: agent.owner.clone(),
            approver: agent.approver.clone(),
            status: if agent.is_active {
                AgentStatus::Active
            } else {
                AgentStatus::Inactive
            },
        }
    }
}

/// Result of a successful challenge-response authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSession {
    /// Agent bearer credential
    pub token: String,
    /// Authenticated agent id
    pub agent_id: String,
    /// Agent email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name
    pub name: String,
    /// Credential lifetime in seconds
    pub expires_in: u64,
}
