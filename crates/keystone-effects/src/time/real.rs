//! Real time effect handler for production use

use async_trait::async_trait;
use keystone_core::effects::{PhysicalTimeEffects, TimeError};
use keystone_core::PhysicalTime;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock handler backed by the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for RealTimeHandler {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TimeError::OperationFailed {
                reason: format!("system clock before Unix epoch: {e}"),
            })?;
        Ok(PhysicalTime::from_ms(elapsed.as_millis() as u64))
    }
}
