//! Agent enrollment and deactivation
//!
//! Both actions are admin-only. Enrollment validates shape, decodes the public
//! key and stores it in canonical form, checks email, public key and id
//! exclusivity against the directory, then fills defaults: a random UUID id,
//! and the enrolling admin as owner and approver.

use keystone_core::effects::{
    AgentDirectoryEffects, IdentityEffects, PhysicalTimeEffects, RandomCoreEffects, SignatureEffects,
};
use keystone_core::validation::{check_enrollment_exclusive, validate_enrollment};
use keystone_core::{Agent, AgentEnrollment, EnrolledAgent, KeystoneError, Principal, Result};
use std::sync::Arc;

/// Admin-side agent registry operations
#[derive(Clone)]
pub struct EnrollmentService {
    public_key_prefix: String,
    agents: Arc<dyn AgentDirectoryEffects>,
    identity: Arc<dyn IdentityEffects>,
    signatures: Arc<dyn SignatureEffects>,
    time: Arc<dyn PhysicalTimeEffects>,
    random: Arc<dyn RandomCoreEffects>,
}

impl EnrollmentService {
    /// Create an enrollment service
    pub fn new(
        public_key_prefix: impl Into<String>,
        agents: Arc<dyn AgentDirectoryEffects>,
        identity: Arc<dyn IdentityEffects>,
        signatures: Arc<dyn SignatureEffects>,
        time: Arc<dyn PhysicalTimeEffects>,
        random: Arc<dyn RandomCoreEffects>,
    ) -> Self {
        Self {
            public_key_prefix: public_key_prefix.into(),
            agents,
            identity,
            signatures,
            time,
            random,
        }
    }

    async fn require_admin(&self, actor: &Principal, action: &str) -> Result<()> {
        if actor.is_agent() || !self.identity.is_admin(&actor.identity).await {
            tracing::warn!(actor = %actor, action, "non-admin agent administration attempt");
            return Err(KeystoneError::forbidden(format!("Only admins can {action} agents")));
        }
        Ok(())
    }

    /// Register a new agent
    #[tracing::instrument(skip(self, fields, actor), fields(actor = %actor))]
    pub async fn enroll_agent(
        &self,
        fields: &AgentEnrollment,
        actor: &Principal,
    ) -> Result<EnrolledAgent> {
        self.require_admin(actor, "enroll").await?;

        let mut enrollment = validate_enrollment(fields, &self.public_key_prefix)?;
        enrollment.public_key = self
            .signatures
            .canonical_public_key(&enrollment.public_key)
            .map_err(|e| KeystoneError::invalid_request(format!("Public key is not usable: {e}")))?;
        check_enrollment_exclusive(self.agents.as_ref(), self.signatures.as_ref(), &enrollment).await?;

        let id = match enrollment.id {
            Some(id) => id,
            None => self.random.random_uuid().await.to_string(),
        };
        let created_at = self.time.now_ms().await?;
        let agent = Agent {
            id,
            email: enrollment.email,
            name: enrollment.name,
            public_key: enrollment.public_key,
            owner: enrollment
                .owner
                .unwrap_or_else(|| actor.identity.clone()),
            approver: enrollment
                .approver
                .unwrap_or_else(|| actor.identity.clone()),
            created_at,
            is_active: true,
        };

        let agent = self.agents.create(agent).await?;
        tracing::info!(agent_id = %agent.id, owner = %agent.owner, approver = %agent.approver, "agent enrolled");
        Ok(EnrolledAgent::from(&agent))
    }

    /// Mark an agent inactive; it can no longer obtain challenges or credentials
    #[tracing::instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn deactivate_agent(&self, agent_id: &str, actor: &Principal) -> Result<EnrolledAgent> {
        self.require_admin(actor, "deactivate").await?;
        let agent = self.agents.deactivate(agent_id).await?;
        tracing::info!(agent_id, "agent deactivated");
        Ok(EnrolledAgent::from(&agent))
    }

    /// Every registered agent, oldest first
    pub async fn list_agents(&self, actor: &Principal) -> Result<Vec<EnrolledAgent>> {
        self.require_admin(actor, "list").await?;
        Ok(self
            .agents
            .list_all()
            .await?
            .iter()
            .map(EnrolledAgent::from)
            .collect())
    }
}
