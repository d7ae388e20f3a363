//! JSON encoding of ledger records

use keystone_core::effects::StorageCoreEffects;
use keystone_core::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key prefix of grant records
pub const GRANT_PREFIX: &str = "grants:";
/// Key prefix of challenge records
pub const CHALLENGE_PREFIX: &str = "challenges:";
/// Key prefix of agent records
pub const AGENT_PREFIX: &str = "agents:";

pub(crate) fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Load one record
pub(crate) async fn load<S, T>(storage: &S, key: &str) -> Result<Option<T>>
where
    S: StorageCoreEffects + ?Sized,
    T: DeserializeOwned,
{
    match storage.retrieve(key).await? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

/// Load every record under `prefix`.
///
/// Keys that disappear between listing and reading are skipped.
pub(crate) async fn scan<S, T>(storage: &S, prefix: &str) -> Result<Vec<T>>
where
    S: StorageCoreEffects + ?Sized,
    T: DeserializeOwned,
{
    let keys = storage.list_keys(Some(prefix)).await?;
    let mut records = Vec::with_capacity(keys.len());
    for key in keys {
        if let Some(record) = load(storage, &key).await? {
            records.push(record);
        }
    }
    Ok(records)
}
