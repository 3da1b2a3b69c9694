//! Retention of dedup history
//!
//! The upstream only ever returns slots inside the sliding window of pages
//! the fetcher queries. `horizon` must be at least that window: a record
//! first seen more than `horizon` ago names a slot that is already in the
//! past, so no later snapshot can contain it again.

use chrono::{DateTime, Duration, Utc};

/// Records first seen before this instant can be evicted
pub fn eviction_cutoff(now: DateTime<Utc>, horizon: Duration) -> DateTime<Utc> {
    now - horizon
}

/// Decides which cycles run retention cleanup: the first one, then every `every` cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionSchedule {
    every: u32,
}

impl EvictionSchedule {
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
        }
    }

    /// `cycle` counts from 1
    pub fn is_due(&self, cycle: u64) -> bool {
        cycle >= 1 && (cycle - 1) % u64::from(self.every) == 0
    }
}
