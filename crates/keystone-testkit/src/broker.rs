//! In-memory broker on a simulated clock

use crate::agent::TestAgent;
use crate::random::MockRandomHandler;
use keystone_core::{
    AgentSession, EnrolledAgent, GrantRequestInput, KeystoneConfig, Principal,
};
use keystone_effects::{
    Ed25519CredentialHandler, Ed25519SignatureHandler, MemoryStorageHandler,
    SimulatedTimeHandler, StaticAdminHandler,
};
use keystone_runtime::{Broker, BrokerEffects};
use std::sync::Arc;

/// Admin identity configured on every test broker
pub const TEST_ADMIN: &str = "root@x";

/// Start of simulated time (Unix ms)
pub const TEST_EPOCH_MS: u64 = 1_700_000_000_000;

/// A broker plus handles to drive it
pub struct TestBroker {
    /// The broker under test
    pub broker: Broker,
    /// Simulated clock shared with the broker
    pub clock: SimulatedTimeHandler,
    /// Backing store shared with the broker
    pub storage: MemoryStorageHandler,
}

impl TestBroker {
    /// Broker with default configuration
    pub fn new() -> Self {
        Self::with_config(KeystoneConfig {
            admins: vec![TEST_ADMIN.to_string()],
            ..KeystoneConfig::default()
        })
    }

    /// Broker with a custom configuration
    pub fn with_config(config: KeystoneConfig) -> Self {
        let clock = SimulatedTimeHandler::new(TEST_EPOCH_MS);
        let storage = MemoryStorageHandler::new();
        let effects = BrokerEffects {
            storage: Arc::new(storage.clone()),
            time: Arc::new(clock.clone()),
            random: Arc::new(MockRandomHandler::default()),
            credentials: Arc::new(Ed25519CredentialHandler::from_secret_bytes(
                config.issuer.clone(),
                &[7; 32],
            )),
            signatures: Arc::new(Ed25519SignatureHandler::new()),
            identity: Arc::new(StaticAdminHandler::new(config.admins.iter().cloned())),
        };
        Self {
            broker: Broker::with_effects(config, effects),
            clock,
            storage,
        }
    }

    /// The configured admin as a session principal
    pub fn admin(&self) -> Principal {
        Principal::session(TEST_ADMIN)
    }

    /// Enroll `agent` as admin
    pub async fn enroll(&self, agent: &TestAgent, owner: &str, approver: &str) -> EnrolledAgent {
        self.broker
            .enrollment()
            .enroll_agent(&agent.enrollment(owner, approver), &self.admin())
            .await
            .unwrap()
    }

    /// Run the full challenge-response handshake for `agent`
    pub async fn authenticate(&self, agent: &TestAgent) -> AgentSession {
        let auth = self.broker.authenticator();
        let issued = auth.create_agent_challenge(&agent.id).await.unwrap();
        auth.authenticate_agent(&agent.id, &issued.challenge, &agent.sign(&issued.challenge))
            .await
            .unwrap()
    }
}

impl Default for TestBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw grant request input
pub fn grant_input(
    requester: &str,
    target: &str,
    grant_type: &str,
    duration: Option<u64>,
) -> GrantRequestInput {
    GrantRequestInput {
        requester: Some(requester.to_string()),
        target: Some(target.to_string()),
        grant_type: Some(grant_type.to_string()),
        duration,
    }
}
