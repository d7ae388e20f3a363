//! Challenge Ledger
//!
//! Issues single-use nonces bound to an agent and consumes them. A challenge
//! is removed on the first consumption attempt whatever the outcome, so a
//! token can never be retried after a mismatch. Removal uses the storage
//! `take` primitive: of two concurrent attempts on the same token at most one
//! observes the record.
//!
//! Expiry is checked lazily at consumption; `purge_expired` is an optional
//! sweep for stores that accumulate abandoned challenges.

use crate::records::{decode, encode, load, CHALLENGE_PREFIX};
use async_trait::async_trait;
use keystone_core::config::DEFAULT_CHALLENGE_TTL_MS;
use keystone_core::effects::{PhysicalTimeEffects, RandomCoreEffects, StorageCoreEffects};
use keystone_core::{Challenge, Result};
use std::sync::Arc;

/// Random bytes per challenge token (256 bits)
pub const CHALLENGE_TOKEN_BYTES: usize = 32;

/// Capability interface for challenge issuance and consumption
#[async_trait]
pub trait ChallengeLedger: Send + Sync {
    /// Issue a fresh challenge for `agent_id` and return its token
    async fn create_challenge(&self, agent_id: &str) -> Result<String>;

    /// Consume `token`, returning true only if it existed, had not expired,
    /// and was issued for `agent_id`. The token is invalid afterwards.
    async fn consume_challenge(&self, token: &str, agent_id: &str) -> Result<bool>;

    /// Remove expired challenges, returning how many were removed
    async fn purge_expired(&self) -> Result<usize>;
}

/// Storage key of a challenge
pub fn challenge_key(token: &str) -> String {
    format!("{CHALLENGE_PREFIX}{token}")
}

/// Whether `token` has the shape of an issued token (lowercase hex)
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == CHALLENGE_TOKEN_BYTES * 2
        && token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Challenge ledger over any key-value storage handler
#[derive(Clone)]
pub struct StorageChallengeLedger<S> {
    storage: S,
    time: Arc<dyn PhysicalTimeEffects>,
    random: Arc<dyn RandomCoreEffects>,
    ttl_ms: u64,
}

impl<S: StorageCoreEffects> StorageChallengeLedger<S> {
    /// Create a ledger issuing challenges with the default 60 second lifetime
    pub fn new(
        storage: S,
        time: Arc<dyn PhysicalTimeEffects>,
        random: Arc<dyn RandomCoreEffects>,
    ) -> Self {
        Self::with_ttl(storage, time, random, DEFAULT_CHALLENGE_TTL_MS)
    }

    /// Create a ledger with a custom challenge lifetime
    pub fn with_ttl(
        storage: S,
        time: Arc<dyn PhysicalTimeEffects>,
        random: Arc<dyn RandomCoreEffects>,
        ttl_ms: u64,
    ) -> Self {
        Self {
            storage,
            time,
            random,
            ttl_ms,
        }
    }

    /// Lifetime of issued challenges
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }
}

#[async_trait]
impl<S: StorageCoreEffects> ChallengeLedger for StorageChallengeLedger<S> {
    async fn create_challenge(&self, agent_id: &str) -> Result<String> {
        let token = hex::encode(self.random.random_bytes_32().await);
        let now = self.time.now_ms().await?;
        let challenge = Challenge {
            token: token.clone(),
            agent_id: agent_id.to_string(),
            expires_at: now.saturating_add(self.ttl_ms),
        };

        self.storage
            .store(&challenge_key(&token), encode(&challenge)?)
            .await?;
        tracing::debug!(agent_id, expires_at = challenge.expires_at, "challenge issued");
        Ok(token)
    }

    async fn consume_challenge(&self, token: &str, agent_id: &str) -> Result<bool> {
        if !is_well_formed_token(token) {
            return Ok(false);
        }

        let Some(bytes) = self.storage.take(&challenge_key(token)).await? else {
            return Ok(false);
        };
        let challenge: Challenge = decode(&bytes)?;
        let now = self.time.now_ms().await?;

        if challenge.is_expired(now) {
            tracing::debug!(agent_id, "challenge expired");
            return Ok(false);
        }
        if !challenge.is_bound_to(agent_id) {
            tracing::warn!(agent_id, "challenge presented by a different agent");
            return Ok(false);
        }
        Ok(true)
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = self.time.now_ms().await?;
        let mut purged = 0;
        for key in self.storage.list_keys(Some(CHALLENGE_PREFIX)).await? {
            let Some(challenge) = load::<_, Challenge>(&self.storage, &key).await? else {
                continue;
            };
            if challenge.is_expired(now) && self.storage.remove(&key).await? {
                purged += 1;
            }
        }
        if purged > 0 {
            tracing::debug!(purged, "expired challenges removed");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_effects::{MemoryStorageHandler, RealRandomHandler, SimulatedTimeHandler};

    fn ledger(
        clock: &SimulatedTimeHandler,
    ) -> StorageChallengeLedger<MemoryStorageHandler> {
        StorageChallengeLedger::new(
            MemoryStorageHandler::new(),
            Arc::new(clock.clone()),
            Arc::new(RealRandomHandler::new()),
        )
    }

    #[tokio::test]
    async fn token_is_256_bit_hex() {
        let clock = SimulatedTimeHandler::new(0);
        let token = ledger(&clock).create_challenge("a1").await.unwrap();
        assert!(is_well_formed_token(&token));
    }

    #[tokio::test]
    async fn consumes_exactly_once() {
        let clock = SimulatedTimeHandler::new(1_000);
        let ledger = ledger(&clock);
        let token = ledger.create_challenge("a1").await.unwrap();

        assert!(ledger.consume_challenge(&token, "a1").await.unwrap());
        assert!(!ledger.consume_challenge(&token, "a1").await.unwrap());
    }

    #[tokio::test]
    async fn mismatched_agent_burns_the_token() {
        let clock = SimulatedTimeHandler::new(1_000);
        let ledger = ledger(&clock);
        let token = ledger.create_challenge("a1").await.unwrap();

        assert!(!ledger.consume_challenge(&token, "a2").await.unwrap());
        assert!(!ledger.consume_challenge(&token, "a1").await.unwrap());
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let clock = SimulatedTimeHandler::new(1_000);
        let ledger = ledger(&clock);

        let at_deadline = ledger.create_challenge("a1").await.unwrap();
        let late = ledger.create_challenge("a1").await.unwrap();

        clock.advance_time(60_000);
        assert!(ledger.consume_challenge(&at_deadline, "a1").await.unwrap());

        clock.advance_time(1);
        assert!(!ledger.consume_challenge(&late, "a1").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_tokens_never_match() {
        let clock = SimulatedTimeHandler::new(0);
        let ledger = ledger(&clock);
        assert!(!ledger.consume_challenge("../../etc", "a1").await.unwrap());
        assert!(!ledger.consume_challenge("", "a1").await.unwrap());
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let clock = SimulatedTimeHandler::new(0);
        let ledger = ledger(&clock);
        ledger.create_challenge("a1").await.unwrap();
        clock.advance_time(30_000);
        let fresh = ledger.create_challenge("a1").await.unwrap();

        clock.advance_time(31_000);
        assert_eq!(ledger.purge_expired().await.unwrap(), 1);
        assert!(ledger.consume_challenge(&fresh, "a1").await.unwrap());
    }
}
