//! Snapshot versus history comparison

use slotwatch_core::{MonitoredTarget, RawSlot, SlotIdentity, SlotSnapshotEntry};
use slotwatch_store::{DedupStore, StoreError};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffOutcome {
    /// Slots not yet recorded, in snapshot order
    pub new_entries: Vec<SlotSnapshotEntry>,
    /// Entries skipped because no identity could be derived
    pub malformed: usize,
    /// Later occurrences of an identity already seen in this snapshot
    pub repeated: usize,
}

/// Select the entries of `snapshot` whose identity is neither in `store`
/// nor earlier in the same snapshot. Order is preserved.
pub fn diff(
    store: &DedupStore,
    target: &MonitoredTarget,
    snapshot: &[RawSlot],
) -> Result<DiffOutcome, StoreError> {
    let mut outcome = DiffOutcome::default();
    let mut seen: HashSet<SlotIdentity> = HashSet::with_capacity(snapshot.len());

    for raw in snapshot {
        let entry = match SlotSnapshotEntry::from_raw(target, raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    target = %target.name(),
                    start = %raw.start,
                    error = %err,
                    "skipping malformed slot"
                );
                outcome.malformed += 1;
                continue;
            }
        };

        if !seen.insert(entry.slot_identity.clone()) {
            outcome.repeated += 1;
            continue;
        }

        if store.exists(&entry.slot_identity)? {
            continue;
        }

        outcome.new_entries.push(entry);
    }

    Ok(outcome)
}
