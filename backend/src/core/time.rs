//! Time source for simulation runs.
//!
//! Every entry the engine produces (log, ledger, broadcast, module
//! transition) is stamped from a single per-run [`SimClock`]. The clock reads
//! wall time but never goes backwards: repeated reads within the same
//! millisecond return the same value, and a wall-clock step backwards is
//! clamped to the last issued timestamp. Creation order, not the timestamp,
//! is the authoritative ordering for entries.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Monotonic non-decreasing timestamp source.
///
/// # Example
/// ```
/// use scenario_simulator_core_rs::SimClock;
///
/// let mut clock = SimClock::new();
/// let a = clock.now();
/// let b = clock.now();
/// assert!(b >= a);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    last: Timestamp,
}

impl SimClock {
    /// Create a clock that has issued no timestamps yet.
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// Issue the next timestamp, never earlier than the previous one.
    pub fn now(&mut self) -> Timestamp {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(self.last);
        self.last = wall.max(self.last);
        self.last
    }

    /// Last timestamp issued (0 if none yet).
    pub fn last(&self) -> Timestamp {
        self.last
    }
}
