//! Randomness effects

use async_trait::async_trait;
use std::sync::Arc;

/// Cryptographically secure randomness
#[async_trait]
pub trait RandomCoreEffects: Send + Sync {
    /// `len` random bytes
    async fn random_bytes(&self, len: usize) -> Vec<u8>;

    /// 32 random bytes
    async fn random_bytes_32(&self) -> [u8; 32];

    /// Random version-4 UUID
    async fn random_uuid(&self) -> uuid::Uuid {
        let bytes = self.random_bytes(16).await;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&bytes[..16]);
        uuid::Builder::from_random_bytes(raw).into_uuid()
    }
}

#[async_trait]
impl<T: RandomCoreEffects + ?Sized> RandomCoreEffects for Arc<T> {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        (**self).random_bytes(len).await
    }

    async fn random_bytes_32(&self) -> [u8; 32] {
        (**self).random_bytes_32().await
    }
}
