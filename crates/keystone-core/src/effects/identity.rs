//! Identity collaborator effects
//!
//! Agent records and admin standing belong to the identity system. These
//! traits are the narrow surface the broker consumes.

use crate::errors::Result;
use crate::types::Agent;
use async_trait::async_trait;
use std::sync::Arc;

/// Admin standing lookup
#[async_trait]
pub trait IdentityEffects: Send + Sync {
    /// Whether `identity` has blanket authorization-policy override
    async fn is_admin(&self, identity: &str) -> bool;
}

/// Agent registry
#[async_trait]
pub trait AgentDirectoryEffects: Send + Sync {
    /// Agent with the given id
    async fn find_by_id(&self, id: &str) -> Result<Option<Agent>>;

    /// Agent with the given email
    async fn find_by_email(&self, email: &str) -> Result<Option<Agent>>;

    /// Agents owned by `owner`
    async fn find_by_owner(&self, owner: &str) -> Result<Vec<Agent>>;

    /// Agents whose approver is `approver`
    async fn find_by_approver(&self, approver: &str) -> Result<Vec<Agent>>;

    /// Every registered agent
    async fn list_all(&self) -> Result<Vec<Agent>>;

    /// Persist a new agent
    async fn create(&self, agent: Agent) -> Result<Agent>;

    /// Clear the active flag, returning the updated agent
    async fn deactivate(&self, id: &str) -> Result<Agent>;
}

#[async_trait]
impl<T: IdentityEffects + ?Sized> IdentityEffects for Arc<T> {
    async fn is_admin(&self, identity: &str) -> bool {
        (**self).is_admin(identity).await
    }
}
