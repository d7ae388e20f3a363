//! Deterministic randomness

use async_trait::async_trait;
use keystone_core::effects::RandomCoreEffects;
use parking_lot::Mutex;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;

/// Seeded random handler; two handlers with the same seed produce the same
/// stream. Clones share the stream.
#[derive(Debug, Clone)]
pub struct MockRandomHandler {
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl MockRandomHandler {
    /// Create a handler seeded with `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
        }
    }
}

impl Default for MockRandomHandler {
    fn default() -> Self {
        Self::new(42)
    }
}

#[async_trait]
impl RandomCoreEffects for MockRandomHandler {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        self.rng.lock().fill_bytes(&mut bytes);
        bytes
    }

    async fn random_bytes_32(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.rng.lock().fill_bytes(&mut bytes);
        bytes
    }
}
