//! Key-value storage effects
//!
//! The broker needs per-key atomic reads and writes, prefix scans, and one
//! atomic read-and-delete primitive (`take`) for single-use records. There
//! are no multi-key transactions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::KeystoneError;

/// Storage operation errors
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum StorageError {
    /// Key rejected by the backend
    #[error("Invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },
    /// Backend read error
    #[error("Read failed: {0}")]
    ReadFailed(String),
    /// Backend write error
    #[error("Write failed: {0}")]
    WriteFailed(String),
    /// Backend delete error
    #[error("Delete failed: {0}")]
    DeleteFailed(String),
}

impl From<StorageError> for KeystoneError {
    fn from(err: StorageError) -> Self {
        KeystoneError::storage(err.to_string())
    }
}

/// Core key-value operations
#[async_trait]
pub trait StorageCoreEffects: Send + Sync {
    /// Write `value` under `key`, replacing any previous value
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Read the value under `key`
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Delete `key`, returning whether it existed
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// Atomically read and delete `key`.
    ///
    /// Of any number of concurrent `take` calls on the same key, at most one
    /// observes the value.
    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// List keys, optionally restricted to those starting with `prefix`
    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError>;
}

#[async_trait]
impl<T: StorageCoreEffects + ?Sized> StorageCoreEffects for Arc<T> {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        (**self).store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).retrieve(key).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        (**self).remove(key).await
    }

    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).take(key).await
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        (**self).list_keys(prefix).await
    }
}
