//! Agent directory over key-value storage
//!
//! A minimal identity collaborator for deployments without an external
//! identity service: agents are stored as JSON under `agents:<id>` and every
//! lookup other than by id is a scan.

use crate::records::{encode, load, scan, AGENT_PREFIX};
use async_trait::async_trait;
use keystone_core::effects::{AgentDirectoryEffects, StorageCoreEffects};
use keystone_core::{Agent, KeystoneError, Result};

/// Storage key of an agent
pub fn agent_key(id: &str) -> String {
    format!("{AGENT_PREFIX}{id}")
}

/// Agent directory over any key-value storage handler
#[derive(Debug, Clone)]
pub struct StorageAgentDirectory<S> {
    storage: S,
}

impl<S: StorageCoreEffects> StorageAgentDirectory<S> {
    /// Create a directory over `storage`
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    async fn matching<F>(&self, keep: F) -> Result<Vec<Agent>>
    where
        F: Fn(&Agent) -> bool + Send,
    {
        let mut agents: Vec<Agent> = scan(&self.storage, AGENT_PREFIX).await?;
        agents.retain(|a| keep(a));
        agents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(agents)
    }
}

#[async_trait]
impl<S: StorageCoreEffects> AgentDirectoryEffects for StorageAgentDirectory<S> {
    async fn find_by_id(&self, id: &str) -> Result<Option<Agent>> {
        load(&self.storage, &agent_key(id)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Agent>> {
        let email = email.to_string();
        Ok(self
            .matching(move |a| a.email.as_deref() == Some(email.as_str()))
            .await?
            .into_iter()
            .next())
    }

    async fn find_by_owner(&self, owner: &str) -> Result<Vec<Agent>> {
        let owner = owner.to_string();
        self.matching(move |a| a.owner == owner).await
    }

    async fn find_by_approver(&self, approver: &str) -> Result<Vec<Agent>> {
        let approver = approver.to_string();
        self.matching(move |a| a.approver == approver).await
    }

    async fn list_all(&self) -> Result<Vec<Agent>> {
        self.matching(|_| true).await
    }

    async fn create(&self, agent: Agent) -> Result<Agent> {
        self.storage
            .store(&agent_key(&agent.id), encode(&agent)?)
            .await?;
        Ok(agent)
    }

    async fn deactivate(&self, id: &str) -> Result<Agent> {
        let mut agent: Agent = load(&self.storage, &agent_key(id))
            .await?
            .ok_or_else(|| KeystoneError::not_found(format!("Agent not found: {id}")))?;
        agent.is_active = false;
        self.storage
            .store(&agent_key(id), encode(&agent)?)
            .await?;
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_effects::MemoryStorageHandler;

    fn agent(id: &str, email: Option<&str>, owner: &str, approver: &str) -> Agent {
        Agent {
            id: id.to_string(),
            email: email.map(str::to_string),
            name: id.to_string(),
            public_key: format!("ssh-ed25519 {id}"),
            owner: owner.to_string(),
            approver: approver.to_string(),
            created_at: 0,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn lookups_by_relationship() {
        let dir = StorageAgentDirectory::new(MemoryStorageHandler::new());
        dir.create(agent("a1", Some("a1@x"), "alice", "carol")).await.unwrap();
        dir.create(agent("a2", None, "alice", "dave")).await.unwrap();

        assert_eq!(dir.find_by_owner("alice").await.unwrap().len(), 2);
        assert_eq!(dir.find_by_approver("dave").await.unwrap()[0].id, "a2");
        assert_eq!(
            dir.find_by_email("a1@x").await.unwrap().map(|a| a.id),
            Some("a1".to_string())
        );
        assert!(dir.find_by_email("nobody@x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deactivate_clears_active_flag() {
        let dir = StorageAgentDirectory::new(MemoryStorageHandler::new());
        dir.create(agent("a1", None, "alice", "carol")).await.unwrap();

        let updated = dir.deactivate("a1").await.unwrap();
        assert!(!updated.is_active);
        assert!(!dir.find_by_id("a1").await.unwrap().unwrap().is_active);
        assert!(dir.deactivate("missing").await.is_err());
    }
}
