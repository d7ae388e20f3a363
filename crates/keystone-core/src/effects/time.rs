//! Wall-clock time effects

use crate::errors::KeystoneError;
use crate::time::PhysicalTime;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error type for time operations.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    /// No clock is available
    #[error("Time service unavailable")]
    ServiceUnavailable,
    /// Clock read failed
    #[error("Operation failed: {reason}")]
    OperationFailed {
        /// Failure description
        reason: String,
    },
}

impl From<TimeError> for KeystoneError {
    fn from(err: TimeError) -> Self {
        KeystoneError::internal(err.to_string())
    }
}

/// Wall-clock time for timestamps and expiry checks
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current wall-clock time
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError>;

    /// Current Unix timestamp in milliseconds
    async fn now_ms(&self) -> Result<u64, TimeError> {
        self.physical_time().await.map(|t| t.ts_ms)
    }
}

/// Blanket implementation for Arc<T> where T: PhysicalTimeEffects
#[async_trait]
impl<T: PhysicalTimeEffects + ?Sized> PhysicalTimeEffects for Arc<T> {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        (**self).physical_time().await
    }
}
