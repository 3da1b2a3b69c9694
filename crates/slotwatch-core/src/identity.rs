//! Slot identity derivation
//!
//! An identity is the SHA-256 of a field-ordered, normalized string:
//!
//! ```text
//! <target name> 0x1F <start as UTC, "%Y-%m-%dT%H:%M:%SZ"> 0x1F <sub id or "">
//! ```
//!
//! Offsets are folded into UTC, so `10:00+02:00` and `08:00Z` name the same
//! slot. Sub-second precision is dropped. The raw upstream payload never
//! participates.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use sha2::{Digest, Sha256};

use crate::error::MalformedSlotError;
use crate::types::{MonitoredTarget, RawSlot, SlotIdentity, SlotSnapshotEntry};

const FIELD_SEPARATOR: char = '\u{1f}';

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an upstream start timestamp. Timestamps without an offset are taken as UTC.
pub fn parse_start(raw: &str) -> Result<DateTime<FixedOffset>, MalformedSlotError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(MalformedSlotError::MissingStart);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| MalformedSlotError::UnparseableStart {
            raw: raw.to_string(),
        })
}

/// The exact string that gets hashed into a [`SlotIdentity`]
pub fn normalized_key(
    target_name: &str,
    scheduled_at: &DateTime<FixedOffset>,
    sub_id: Option<&str>,
) -> String {
    let start = scheduled_at
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string();
    let sub_id = sub_id.map(str::trim).unwrap_or("");

    let mut key = String::with_capacity(target_name.len() + start.len() + sub_id.len() + 2);
    key.extend(target_name.chars().filter(|&c| c != FIELD_SEPARATOR));
    key.push(FIELD_SEPARATOR);
    key.push_str(&start);
    key.push(FIELD_SEPARATOR);
    key.extend(sub_id.chars().filter(|&c| c != FIELD_SEPARATOR));
    key
}

fn hash_key(key: &str) -> SlotIdentity {
    let digest = Sha256::digest(key.as_bytes());
    SlotIdentity::from_digest(&digest)
}

/// Derive the stable identity of `slot` as offered by `target`
pub fn identity_of(
    target: &MonitoredTarget,
    slot: &RawSlot,
) -> Result<SlotIdentity, MalformedSlotError> {
    let scheduled_at = parse_start(&slot.start)?;
    Ok(hash_key(&normalized_key(
        target.name(),
        &scheduled_at,
        slot.sub_id.as_deref(),
    )))
}

impl SlotSnapshotEntry {
    /// Parse and identify a raw slot in one pass
    pub fn from_raw(target: &MonitoredTarget, slot: &RawSlot) -> Result<Self, MalformedSlotError> {
        let scheduled_at = parse_start(&slot.start)?;
        let slot_identity = hash_key(&normalized_key(
            target.name(),
            &scheduled_at,
            slot.sub_id.as_deref(),
        ));
        Ok(Self {
            slot_identity,
            scheduled_at,
            sub_id: slot.sub_id.clone(),
            raw_metadata: slot.metadata.clone(),
        })
    }
}
