//! Random effect handlers
//!
//! This is the handler layer where actual system randomness is provided;
//! deterministic handlers live in `keystone-testkit`.

use async_trait::async_trait;
use keystone_core::effects::RandomCoreEffects;
use rand::RngCore;

/// Real random handler using the thread-local CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RealRandomHandler;

impl RealRandomHandler {
    /// Create a new real random handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RandomCoreEffects for RealRandomHandler {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    async fn random_bytes_32(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }
}
