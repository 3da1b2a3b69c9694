use chrono::{DateTime, Utc};
use serde::Serialize;
use slotwatch_core::SlotIdentity;

/// A persisted "already notified" marker for one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupRecord {
    pub slot_identity: SlotIdentity,
    pub target_name: String,
    pub first_seen_at: DateTime<Utc>,
    /// Rows are only written after a confirmed delivery, so this is always true
    pub notified: bool,
}

/// Result of an insert-if-absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Inserted,
    /// Another writer recorded this identity first
    AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetCount {
    pub target_name: String,
    pub records: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub oldest_first_seen: Option<DateTime<Utc>>,
    pub newest_first_seen: Option<DateTime<Utc>>,
    /// Sorted by target name
    pub per_target: Vec<TargetCount>,
}
