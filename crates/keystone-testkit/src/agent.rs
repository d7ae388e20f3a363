//! Agents with real key pairs

use ed25519_dalek::{Signer, SigningKey};
use keystone_core::{agent_identity, AgentEnrollment};
use keystone_effects::encode_ssh_ed25519;

/// An agent identity holding its private key
#[derive(Debug, Clone)]
pub struct TestAgent {
    /// Agent id
    pub id: String,
    signing_key: SigningKey,
}

impl TestAgent {
    /// Agent `id` with a key derived from `seed`
    pub fn new(id: impl Into<String>, seed: u8) -> Self {
        Self {
            id: id.into(),
            signing_key: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    /// Canonical identity string
    pub fn identity(&self) -> String {
        agent_identity(&self.id)
    }

    /// Public key line for enrollment
    pub fn public_key(&self) -> String {
        encode_ssh_ed25519(&self.signing_key.verifying_key())
    }

    /// Sign a challenge token
    pub fn sign(&self, challenge: &str) -> Vec<u8> {
        self.signing_key.sign(challenge.as_bytes()).to_bytes().to_vec()
    }

    /// Enrollment fields naming this agent's id and key
    pub fn enrollment(&self, owner: &str, approver: &str) -> AgentEnrollment {
        AgentEnrollment {
            id: Some(self.id.clone()),
            email: Some(format!("{}@agents.test", self.id)),
            name: Some(format!("Agent {}", self.id)),
            public_key: Some(self.public_key()),
            owner: Some(owner.to_string()),
            approver: Some(approver.to_string()),
        }
    }
}
