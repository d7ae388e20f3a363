//! Visibility Filter
//!
//! Which grants a listing returns, in precedence order:
//!
//! 1. An explicit, non-blank `requester` filter returns that requester's
//!    grants and bypasses caller-based visibility entirely. A blank one is
//!    treated as absent.
//! 2. Without a caller, only pending grants.
//! 3. Admins see everything.
//! 4. Anyone else sees grants they are the target or requester of, grants
//!    requested by agents they own or approve, and every pending grant.

use keystone_core::effects::{AgentDirectoryEffects, IdentityEffects};
use keystone_core::{Grant, GrantFilter, GrantStatus, IdentityRef, Principal, Result};
use keystone_store::GrantLedger;
use std::collections::HashSet;
use std::sync::Arc;

/// Visibility of grants for one non-admin caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantVisibility {
    caller: String,
    related_agent_ids: HashSet<String>,
}

impl GrantVisibility {
    /// Visibility for `caller`, who owns or approves `related_agent_ids`
    pub fn new(caller: impl Into<String>, related_agent_ids: HashSet<String>) -> Self {
        Self {
            caller: caller.into(),
            related_agent_ids,
        }
    }

    /// Whether `grant` is visible to the caller
    pub fn is_visible(&self, grant: &Grant) -> bool {
        if grant.request.target == self.caller || grant.request.requester == self.caller {
            return true;
        }
        if IdentityRef::parse(&grant.request.requester)
            .agent_id()
            .is_some_and(|id| self.related_agent_ids.contains(id))
        {
            return true;
        }
        grant.status == GrantStatus::Pending
    }
}

/// Listing entry point combining the ledger with caller identity
#[derive(Clone)]
pub struct VisibilityFilter {
    ledger: Arc<dyn GrantLedger>,
    agents: Arc<dyn AgentDirectoryEffects>,
    identity: Arc<dyn IdentityEffects>,
}

impl VisibilityFilter {
    /// Create a filter over the given ledger and collaborators
    pub fn new(
        ledger: Arc<dyn GrantLedger>,
        agents: Arc<dyn AgentDirectoryEffects>,
        identity: Arc<dyn IdentityEffects>,
    ) -> Self {
        Self {
            ledger,
            agents,
            identity,
        }
    }

    /// Visibility for a non-admin caller
    pub async fn visibility_for(&self, caller: &str) -> Result<GrantVisibility> {
        let owned = self.agents.find_by_owner(caller).await?;
        let approved = self.agents.find_by_approver(caller).await?;
        let related = owned
            .into_iter()
            .chain(approved)
            .map(|agent| agent.id)
            .collect();
        Ok(GrantVisibility::new(caller, related))
    }

    /// Grants visible for `filter` and `caller`, newest first
    pub async fn list(&self, filter: &GrantFilter, caller: Option<&Principal>) -> Result<Vec<Grant>> {
        if let Some(requester) = filter
            .requester
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
        {
            return self.ledger.find_by_requester(requester).await;
        }

        let Some(caller) = caller else {
            return self.ledger.find_pending().await;
        };

        if self.identity.is_admin(&caller.identity).await {
            return self.ledger.find_all().await;
        }

        let visibility = self.visibility_for(&caller.identity).await?;
        let mut grants = self.ledger.find_all().await?;
        grants.retain(|g| visibility.is_visible(g));
        tracing::debug!(caller = %caller, visible = grants.len(), "grants listed");
        Ok(grants)
    }
}
