//! Wall-clock time values.
//!
//! All persisted timestamps are Unix milliseconds. `PhysicalTime` is what the
//! time effect returns; records store the bare `u64` so the JSON shape stays
//! flat.

use serde::{Deserialize, Serialize};

/// Milliseconds in one second
pub const MILLIS_PER_SECOND: u64 = 1000;

/// A wall-clock reading in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysicalTime {
    /// Unix timestamp in milliseconds
    pub ts_ms: u64,
}

impl PhysicalTime {
    /// Create a physical time from Unix milliseconds
    pub fn from_ms(ts_ms: u64) -> Self {
        Self { ts_ms }
    }

    /// Unix timestamp in whole seconds
    pub fn as_secs(&self) -> u64 {
        self.ts_ms / MILLIS_PER_SECOND
    }

    /// Time shifted forward by `ms`, saturating at `u64::MAX`
    pub fn plus_ms(&self, ms: u64) -> Self {
        Self {
            ts_ms: self.ts_ms.saturating_add(ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_ms_saturates() {
        let t = PhysicalTime::from_ms(u64::MAX - 1);
        assert_eq!(t.plus_ms(10).ts_ms, u64::MAX);
        assert_eq!(PhysicalTime::from_ms(61_500).as_secs(), 61);
    }
}
