//! Simulated time effect handler for testing

use async_trait::async_trait;
use keystone_core::effects::{PhysicalTimeEffects, TimeError};
use keystone_core::PhysicalTime;
use parking_lot::Mutex;
use std::sync::Arc;

/// Manually driven clock.
///
/// Clones share the same clock, so a test can keep one handle and advance
/// time under a service that holds another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedTimeHandler {
    /// Current simulated time in milliseconds
    current_time: Arc<Mutex<u64>>,
}

impl SimulatedTimeHandler {
    /// Create a new simulated time handler starting at the given time
    pub fn new(start_time_ms: u64) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start_time_ms)),
        }
    }

    /// Advance simulated time by the given duration
    pub fn advance_time(&self, duration_ms: u64) {
        let mut time = self.current_time.lock();
        *time = time.saturating_add(duration_ms);
    }

    /// Set the absolute simulated time
    pub fn set_time(&self, time_ms: u64) {
        *self.current_time.lock() = time_ms;
    }

    /// Get the current simulated time
    pub fn get_time(&self) -> u64 {
        *self.current_time.lock()
    }
}

#[async_trait]
impl PhysicalTimeEffects for SimulatedTimeHandler {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        Ok(PhysicalTime::from_ms(self.get_time()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_the_clock() {
        let clock = SimulatedTimeHandler::new(1_000);
        let handle = clock.clone();
        handle.advance_time(500);
        assert_eq!(clock.now_ms().await.unwrap(), 1_500);
        clock.set_time(10);
        assert_eq!(handle.get_time(), 10);
    }
}
