//! Grant Service
//!
//! Entry point for every grant action. Each call loads what it needs from the
//! ledger, consults the policy, asks the state machine for the next status,
//! and persists through `GrantLedger::update_status`, so a rejected call
//! never leaves a partial mutation behind.

use crate::credential::{authz_expiry, GrantCredential, VerificationOutcome};
use crate::state_machine::{self, Transition, TransitionOutcome};
use keystone_authorization::{AuthorizationPolicy, GrantAction, VisibilityFilter};
use keystone_core::config::DEFAULT_AUTHZ_TOKEN_TTL_SECS;
use keystone_core::effects::{
    AgentDirectoryEffects, CredentialEffects, IdentityEffects, PhysicalTimeEffects,
    RandomCoreEffects,
};
use keystone_core::validation::validate_grant_request;
use keystone_core::{
    CredentialClaims, CredentialKind, Grant, GrantFilter, GrantRequestInput, KeystoneConfig,
    KeystoneError, PhysicalTime, Principal, Result,
};
use keystone_store::GrantLedger;
use std::sync::Arc;

/// Configuration for the grant service
#[derive(Debug, Clone)]
pub struct GrantConfig {
    /// Lifetime of authz credentials in seconds
    pub authz_token_ttl_secs: u64,
}

impl Default for GrantConfig {
    fn default() -> Self {
        Self {
            authz_token_ttl_secs: DEFAULT_AUTHZ_TOKEN_TTL_SECS,
        }
    }
}

impl From<&KeystoneConfig> for GrantConfig {
    fn from(config: &KeystoneConfig) -> Self {
        Self {
            authz_token_ttl_secs: config.authz_token_ttl_secs,
        }
    }
}

/// Grant lifecycle coordinator
#[derive(Clone)]
pub struct GrantService {
    config: GrantConfig,
    ledger: Arc<dyn GrantLedger>,
    policy: AuthorizationPolicy,
    visibility: VisibilityFilter,
    credentials: Arc<dyn CredentialEffects>,
    time: Arc<dyn PhysicalTimeEffects>,
    random: Arc<dyn RandomCoreEffects>,
}

impl GrantService {
    /// Create a service over injected ledgers and collaborators
    pub fn new(
        config: GrantConfig,
        ledger: Arc<dyn GrantLedger>,
        agents: Arc<dyn AgentDirectoryEffects>,
        identity: Arc<dyn IdentityEffects>,
        credentials: Arc<dyn CredentialEffects>,
        time: Arc<dyn PhysicalTimeEffects>,
        random: Arc<dyn RandomCoreEffects>,
    ) -> Self {
        Self {
            config,
            policy: AuthorizationPolicy::new(agents.clone(), identity.clone()),
            visibility: VisibilityFilter::new(ledger.clone(), agents, identity),
            ledger,
            credentials,
            time,
            random,
        }
    }

    /// Service configuration
    pub fn config(&self) -> &GrantConfig {
        &self.config
    }

    async fn now(&self) -> Result<PhysicalTime> {
        Ok(self.time.physical_time().await?)
    }

    async fn load(&self, id: &str) -> Result<Grant> {
        self.ledger
            .find_by_id(id)
            .await?
            .ok_or_else(|| KeystoneError::not_found("Grant not found"))
    }

    /// Run `transition` on `grant`, persisting any status change
    async fn transition(&self, grant: Grant, transition: Transition, now_ms: u64) -> Result<Grant> {
        match state_machine::apply(&grant, &transition, now_ms)? {
            TransitionOutcome::Changed { status, update } => {
                let updated = self.ledger.update_status(&grant.id, status, update).await?;
                tracing::info!(grant_id = %updated.id, from = %grant.status, to = %updated.status, "grant transitioned");
                Ok(updated)
            }
            TransitionOutcome::Unchanged => Ok(grant),
        }
    }

    async fn issue_authz(&self, grant: Grant, now: PhysicalTime) -> Result<GrantCredential> {
        let iat = now.as_secs();
        let expires_at = authz_expiry(&grant, iat, self.config.authz_token_ttl_secs);
        let claims = CredentialClaims::authz(&grant, self.credentials.issuer(), iat, expires_at);
        let token = self.credentials.issue_credential(&claims).await?;
        Ok(GrantCredential {
            grant,
            token,
            expires_at,
        })
    }

    /// Create a pending grant.
    ///
    /// An agent caller is always recorded as the requester, whatever the
    /// request says.
    #[tracing::instrument(skip(self, input, caller))]
    pub async fn create_grant(
        &self,
        mut input: GrantRequestInput,
        caller: Option<&Principal>,
    ) -> Result<Grant> {
        if let Some(agent) = caller.filter(|p| p.is_agent()) {
            input.requester = Some(agent.identity.clone());
        }
        let request = validate_grant_request(&input)?;

        let id = self.random.random_uuid().await.to_string();
        let now = self.now().await?;
        let grant = Grant::pending(id, request, now.ts_ms);
        self.ledger.save(&grant).await?;

        tracing::info!(
            grant_id = %grant.id,
            requester = %grant.request.requester,
            target = %grant.request.target,
            grant_type = %grant.request.grant_type,
            "grant requested"
        );
        Ok(grant)
    }

    /// Approve a pending grant and issue its authz credential
    #[tracing::instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn approve_grant(&self, id: &str, actor: &Principal) -> Result<GrantCredential> {
        let grant = self.load(id).await?;
        self.policy
            .authorize(GrantAction::Approve, actor, &grant)
            .await?;

        let now = self.now().await?;
        let approved = self
            .transition(
                grant,
                Transition::Approve {
                    by: actor.identity.clone(),
                },
                now.ts_ms,
            )
            .await?;
        self.issue_authz(approved, now).await
    }

    /// Deny a pending grant
    #[tracing::instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn deny_grant(&self, id: &str, actor: &Principal) -> Result<Grant> {
        let grant = self.load(id).await?;
        self.policy.authorize(GrantAction::Deny, actor, &grant).await?;

        let now = self.now().await?;
        self.transition(
            grant,
            Transition::Deny {
                by: actor.identity.clone(),
            },
            now.ts_ms,
        )
        .await
    }

    /// Revoke an approved grant; revoking a revoked or denied grant is a no-op
    #[tracing::instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn revoke_grant(&self, id: &str, actor: &Principal) -> Result<Grant> {
        let grant = self.load(id).await?;
        self.policy
            .authorize(GrantAction::Revoke, actor, &grant)
            .await?;

        let now = self.now().await?;
        self.transition(grant, Transition::Revoke, now.ts_ms).await
    }

    /// Redeem a grant: consumes `once` grants, checks the window of `timed`
    #[tracing::instrument(skip(self))]
    pub async fn use_grant(&self, id: &str) -> Result<Grant> {
        let grant = self.load(id).await?;
        let now = self.now().await?;
        self.transition(grant, Transition::Use, now.ts_ms).await
    }

    /// Current state of a grant
    pub async fn introspect_grant(&self, id: &str) -> Result<Grant> {
        self.load(id).await
    }

    /// Grants visible to `caller`, newest first
    pub async fn list_grants(
        &self,
        filter: &GrantFilter,
        caller: Option<&Principal>,
    ) -> Result<Vec<Grant>> {
        self.visibility.list(filter, caller).await
    }

    /// Issue an authz credential for the caller's own approved grant
    #[tracing::instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn issue_grant_token(&self, id: &str, actor: &Principal) -> Result<GrantCredential> {
        let grant = self.load(id).await?;
        self.policy
            .authorize(GrantAction::FetchToken, actor, &grant)
            .await?;

        let now = self.now().await?;
        state_machine::ensure_redeemable(&grant, now.ts_ms)?;
        self.issue_authz(grant, now).await
    }

    /// Verify a presented authz credential against the current grant state.
    ///
    /// For `once` grants a successful verification is the redemption.
    #[tracing::instrument(skip_all)]
    pub async fn verify_grant_credential(&self, token: &str) -> Result<VerificationOutcome> {
        let now = self.now().await?;
        let verification = self
            .credentials
            .verify_credential(token, now.as_secs())
            .await;
        let claims = match verification.claims {
            Some(claims) if verification.valid => claims,
            _ => {
                let error = verification
                    .error
                    .unwrap_or_else(|| "Invalid token".to_string());
                tracing::warn!(%error, "credential rejected");
                return Ok(VerificationOutcome::rejected(error));
            }
        };

        if claims.kind != CredentialKind::Authz {
            return Ok(VerificationOutcome::rejected("Not an authorization token"));
        }
        let Some(grant_id) = claims.grant_id.clone() else {
            return Ok(VerificationOutcome::rejected("Missing grant_id in token"));
        };
        let Some(grant) = self.ledger.find_by_id(&grant_id).await? else {
            return Ok(VerificationOutcome::rejected("Grant not found"));
        };

        match self.transition(grant, Transition::Use, now.ts_ms).await {
            Ok(grant) => Ok(VerificationOutcome::accepted(claims, grant)),
            Err(err @ (KeystoneError::InvalidState { .. } | KeystoneError::Expired { .. })) => {
                tracing::warn!(%grant_id, error = %err, "credential for unusable grant");
                Ok(VerificationOutcome::from_lifecycle_error(&err))
            }
            Err(err) => Err(err),
        }
    }
}
