//! Single-use authentication nonces

use serde::{Deserialize, Serialize};

/// A stored challenge bound to one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Random printable token handed to the agent
    pub token: String,
    /// Agent the challenge was issued for
    pub agent_id: String,
    /// Expiry (Unix ms)
    pub expires_at: u64,
}

impl Challenge {
    /// Whether the challenge is past its expiry at `now_ms`
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at < now_ms
    }

    /// Whether the challenge was issued for `agent_id`
    pub fn is_bound_to(&self, agent_id: &str) -> bool {
        self.agent_id == agent_id
    }
}
