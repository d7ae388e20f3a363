//! Grant Ledger
//!
//! Durable store of grant records keyed by id. `update_status` is the only
//! mutation path for an existing grant: it loads the record, merges the new
//! status together with its causal metadata, and writes the result back as a
//! single value, so a status change is never visible without its metadata.
//!
//! Listing queries scan every grant key and sort newest first. The cost is
//! linear in the number of grants, which suits an authorization ledger.
//!
//! `update_status` is load-merge-store with last-writer-wins semantics; two
//! simultaneous decisions on the same grant are not serialized against each
//! other.

use crate::records::{encode, load, scan, GRANT_PREFIX};
use async_trait::async_trait;
use keystone_core::effects::StorageCoreEffects;
use keystone_core::{Grant, GrantStatus, GrantUpdate, KeystoneError, Result};

/// Capability interface for grant persistence
#[async_trait]
pub trait GrantLedger: Send + Sync {
    /// Insert or replace a grant by id
    async fn save(&self, grant: &Grant) -> Result<()>;

    /// Grant with the given id
    async fn find_by_id(&self, id: &str) -> Result<Option<Grant>>;

    /// Set `status` and merge `update` into an existing grant.
    ///
    /// Fails with `NotFound` if the grant does not exist.
    async fn update_status(&self, id: &str, status: GrantStatus, update: GrantUpdate)
        -> Result<Grant>;

    /// Pending grants, newest first
    async fn find_pending(&self) -> Result<Vec<Grant>>;

    /// Grants requested by `requester`, newest first
    async fn find_by_requester(&self, requester: &str) -> Result<Vec<Grant>>;

    /// Every grant, newest first
    async fn find_all(&self) -> Result<Vec<Grant>>;
}

/// Storage key of a grant
pub fn grant_key(id: &str) -> String {
    format!("{GRANT_PREFIX}{id}")
}

/// Newest first; ids break ties so listings are stable.
pub fn sort_newest_first(grants: &mut [Grant]) {
    grants.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Grant ledger over any key-value storage handler
#[derive(Debug, Clone)]
pub struct StorageGrantLedger<S> {
    storage: S,
}

impl<S: StorageCoreEffects> StorageGrantLedger<S> {
    /// Create a ledger over `storage`
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    async fn filtered<F>(&self, keep: F) -> Result<Vec<Grant>>
    where
        F: Fn(&Grant) -> bool + Send,
    {
        let mut grants: Vec<Grant> = scan(&self.storage, GRANT_PREFIX).await?;
        grants.retain(|g| keep(g));
        sort_newest_first(&mut grants);
        Ok(grants)
    }
}

#[async_trait]
impl<S: StorageCoreEffects> GrantLedger for StorageGrantLedger<S> {
    async fn save(&self, grant: &Grant) -> Result<()> {
        tracing::debug!(grant_id = %grant.id, status = %grant.status, "saving grant");
        self.storage
            .store(&grant_key(&grant.id), encode(grant)?)
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Grant>> {
        load(&self.storage, &grant_key(id)).await
    }

    async fn update_status(
        &self,
        id: &str,
        status: GrantStatus,
        update: GrantUpdate,
    ) -> Result<Grant> {
        let mut grant: Grant = load(&self.storage, &grant_key(id))
            .await?
            .ok_or_else(|| KeystoneError::not_found(format!("Grant not found: {id}")))?;

        grant.apply_update(status, &update);
        self.save(&grant).await?;
        Ok(grant)
    }

    async fn find_pending(&self) -> Result<Vec<Grant>> {
        self.filtered(|g| g.status == GrantStatus::Pending).await
    }

    async fn find_by_requester(&self, requester: &str) -> Result<Vec<Grant>> {
        let requester = requester.to_string();
        self.filtered(move |g| g.request.requester == requester)
            .await
    }

    async fn find_all(&self) -> Result<Vec<Grant>> {
        self.filtered(|_| true).await
    }
}
