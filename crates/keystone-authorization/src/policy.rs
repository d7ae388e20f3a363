//! Authorization Policy
//!
//! Decides whether a caller may act on a grant.
//!
//! - approve, deny, revoke: the approver of the agent the requester resolves
//!   to, or any admin. A requester that does not resolve to a registered
//!   agent leaves only admins.
//! - fetch-token: only the requesting agent itself, authenticated as an
//!   agent. There is no approver or admin override.
//!
//! `decide` is the pure rule; `AuthorizationPolicy` gathers its inputs from
//! the identity collaborator.

use keystone_core::effects::{AgentDirectoryEffects, IdentityEffects};
use keystone_core::{Agent, Grant, IdentityRef, KeystoneError, Principal, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Actions gated by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrantAction {
    /// Approve a pending grant
    Approve,
    /// Deny a pending grant
    Deny,
    /// Revoke an approved grant
    Revoke,
    /// Obtain an authz credential for an approved grant
    FetchToken,
}

impl GrantAction {
    /// Verb used in denial messages
    pub fn verb(&self) -> &'static str {
        match self {
            GrantAction::Approve => "approve",
            GrantAction::Deny => "deny",
            GrantAction::Revoke => "revoke",
            GrantAction::FetchToken => "fetch a token for",
        }
    }
}

impl fmt::Display for GrantAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GrantAction::Approve => "approve",
            GrantAction::Deny => "deny",
            GrantAction::Revoke => "revoke",
            GrantAction::FetchToken => "fetch-token",
        })
    }
}

/// Policy decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether access is allowed
    pub allowed: bool,
    /// Reason for the decision
    pub reason: String,
}

impl AccessDecision {
    /// Allow access
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    /// Deny access with reason
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }

    /// Convert a denial into `Forbidden`
    pub fn into_result(self) -> Result<()> {
        if self.allowed {
            Ok(())
        } else {
            Err(KeystoneError::forbidden(self.reason))
        }
    }
}

/// Pure policy rule.
///
/// `requester_agent` is the agent the grant's requester resolves to, if any.
pub fn decide(
    action: GrantAction,
    actor: &Principal,
    grant: &Grant,
    requester_agent: Option<&Agent>,
    actor_is_admin: bool,
) -> AccessDecision {
    match action {
        GrantAction::FetchToken => {
            if !actor.is_agent() {
                AccessDecision::deny("Only an authenticated agent can fetch a grant token")
            } else if actor.identity != grant.request.requester {
                AccessDecision::deny("Grant does not belong to this agent")
            } else {
                AccessDecision::allow("requesting agent")
            }
        }
        GrantAction::Approve | GrantAction::Deny | GrantAction::Revoke => match requester_agent {
            Some(agent) if agent.approver == actor.identity => {
                AccessDecision::allow("agent approver")
            }
            _ if actor_is_admin => AccessDecision::allow("admin"),
            Some(_) => AccessDecision::deny(format!(
                "Only the agent approver or admin can {} this grant",
                action.verb()
            )),
            None => AccessDecision::deny(format!(
                "Only an admin can {} a grant whose requester is not a registered agent",
                action.verb()
            )),
        },
    }
}

/// Authorization policy backed by the identity collaborator
#[derive(Clone)]
pub struct AuthorizationPolicy {
    agents: Arc<dyn AgentDirectoryEffects>,
    identity: Arc<dyn IdentityEffects>,
}

impl AuthorizationPolicy {
    /// Create a policy over the given collaborators
    pub fn new(agents: Arc<dyn AgentDirectoryEffects>, identity: Arc<dyn IdentityEffects>) -> Self {
        Self { agents, identity }
    }

    /// Resolve an identity string to a registered agent
    pub async fn resolve_agent(&self, identity: &str) -> Result<Option<Agent>> {
        match IdentityRef::parse(identity).agent_id() {
            Some(agent_id) => self.agents.find_by_id(agent_id).await,
            None => Ok(None),
        }
    }

    /// Evaluate `action` by `actor` on `grant`
    pub async fn evaluate(
        &self,
        action: GrantAction,
        actor: &Principal,
        grant: &Grant,
    ) -> Result<AccessDecision> {
        if action == GrantAction::FetchToken {
            return Ok(decide(action, actor, grant, None, false));
        }
        let requester_agent = self.resolve_agent(&grant.request.requester).await?;
        let is_admin = self.identity.is_admin(&actor.identity).await;
        Ok(decide(
            action,
            actor,
            grant,
            requester_agent.as_ref(),
            is_admin,
        ))
    }

    /// Fail with `Forbidden` unless `actor` may perform `action` on `grant`
    pub async fn authorize(&self, action: GrantAction, actor: &Principal, grant: &Grant) -> Result<()> {
        let decision = self.evaluate(action, actor, grant).await?;
        if decision.allowed {
            tracing::debug!(grant_id = %grant.id, %action, actor = %actor, reason = %decision.reason, "authorized");
        } else {
            tracing::warn!(grant_id = %grant.id, %action, actor = %actor, "authorization denied");
        }
        decision.into_result()
    }
}
