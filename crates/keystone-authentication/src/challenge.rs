//! Challenge-response authentication
//!
//! 1. The agent asks for a challenge; the ledger issues a random token bound
//!    to its id.
//! 2. The agent signs the token bytes with its private key.
//! 3. The broker consumes the challenge (burning it whatever happens next),
//!    re-checks the agent is active, verifies the signature against the
//!    enrolled key, and issues an agent credential with `sub = agent:<id>`.
//!
//! Agent credentials are later presented as bearer tokens and resolved back
//! into an agent `Principal`.

use keystone_core::effects::{
    AgentDirectoryEffects, CredentialEffects, PhysicalTimeEffects, SignatureEffects,
};
use keystone_core::time::MILLIS_PER_SECOND;
use keystone_core::{
    Agent, AgentSession, CredentialClaims, CredentialKind, IdentityRef, KeystoneError,
    Principal, Result,
};
use keystone_store::ChallengeLedger;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const AGENT_UNAVAILABLE: &str = "Agent not found or inactive";

/// A freshly issued challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedChallenge {
    /// Agent the challenge is bound to
    pub agent_id: String,
    /// Token to sign
    pub challenge: String,
    /// Seconds until the challenge expires
    pub expires_in: u64,
}

/// Agent authentication over the challenge ledger
#[derive(Clone)]
pub struct AgentAuthenticator {
    agent_token_ttl_secs: u64,
    challenge_ttl_ms: u64,
    agents: Arc<dyn AgentDirectoryEffects>,
    challenges: Arc<dyn ChallengeLedger>,
    signatures: Arc<dyn SignatureEffects>,
    credentials: Arc<dyn CredentialEffects>,
    time: Arc<dyn PhysicalTimeEffects>,
}

impl AgentAuthenticator {
    /// Create an authenticator
    pub fn new(
        agent_token_ttl_secs: u64,
        challenge_ttl_ms: u64,
        agents: Arc<dyn AgentDirectoryEffects>,
        challenges: Arc<dyn ChallengeLedger>,
        signatures: Arc<dyn SignatureEffects>,
        credentials: Arc<dyn CredentialEffects>,
        time: Arc<dyn PhysicalTimeEffects>,
    ) -> Self {
        Self {
            agent_token_ttl_secs,
            challenge_ttl_ms,
            agents,
            challenges,
            signatures,
            credentials,
            time,
        }
    }

    async fn active_agent(&self, agent_id: &str) -> Result<Agent> {
        match self.agents.find_by_id(agent_id).await? {
            Some(agent) if agent.is_active => Ok(agent),
            _ => Err(KeystoneError::not_found(AGENT_UNAVAILABLE)),
        }
    }

    /// Issue a challenge for an active agent
    #[tracing::instrument(skip(self))]
    pub async fn create_agent_challenge(&self, agent_id: &str) -> Result<IssuedChallenge> {
        self.active_agent(agent_id).await?;
        let challenge = self.challenges.create_challenge(agent_id).await?;
        Ok(IssuedChallenge {
            agent_id: agent_id.to_string(),
            challenge,
            expires_in: self.challenge_ttl_ms / MILLIS_PER_SECOND,
        })
    }

    /// Complete the handshake and issue an agent credential
    #[tracing::instrument(skip(self, challenge, signature))]
    pub async fn authenticate_agent(
        &self,
        agent_id: &str,
        challenge: &str,
        signature: &[u8],
    ) -> Result<AgentSession> {
        if !self.challenges.consume_challenge(challenge, agent_id).await? {
            tracing::warn!(agent_id, "challenge rejected");
            return Err(KeystoneError::unauthenticated(
                "Invalid, expired, or already used challenge",
            ));
        }

        let agent = self.active_agent(agent_id).await?;
        let verified = self
            .signatures
            .verify_signature(&agent.public_key, challenge.as_bytes(), signature)
            .await?;
        if !verified {
            tracing::warn!(agent_id, "challenge signature did not verify");
            return Err(KeystoneError::unauthenticated("Invalid signature"));
        }

        let iat = self.time.physical_time().await?.as_secs();
        let claims = CredentialClaims::agent(
            agent.identity(),
            self.credentials.issuer(),
            iat,
            iat.saturating_add(self.agent_token_ttl_secs),
        );
        let token = self.credentials.issue_credential(&claims).await?;
        tracing::info!(agent_id, "agent authenticated");

        Ok(AgentSession {
            token,
            agent_id: agent.id,
            email: agent.email,
            name: agent.name,
            expires_in: self.agent_token_ttl_secs,
        })
    }

    /// Resolve an agent bearer credential to its principal
    pub async fn authenticate_bearer(&self, token: &str) -> Result<Principal> {
        let now = self.time.physical_time().await?.as_secs();
        let verification = self.credentials.verify_credential(token, now).await;
        let claims = match verification.claims {
            Some(claims) if verification.valid => claims,
            _ => {
                return Err(KeystoneError::unauthenticated(
                    verification
                        .error
                        .unwrap_or_else(|| "Invalid token".to_string()),
                ))
            }
        };
        if claims.kind != CredentialKind::Agent {
            return Err(KeystoneError::unauthenticated("Not an agent token"));
        }
        let Some(agent_id) = IdentityRef::parse(&claims.sub).agent_id() else {
            return Err(KeystoneError::unauthenticated("Token subject is not an agent"));
        };

        match self.agents.find_by_id(agent_id).await? {
            Some(agent) if agent.is_active => Ok(Principal::agent(&agent.id)),
            _ => Err(KeystoneError::unauthenticated(AGENT_UNAVAILABLE)),
        }
    }
}
