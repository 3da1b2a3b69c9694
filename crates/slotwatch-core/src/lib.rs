//! Core types for slot change detection: targets, slot identities, configuration

mod config;
mod error;
mod identity;
mod types;

pub use config::{
    retention_days, Config, NotifierConfig, DEFAULT_DAYS_TO_CHECK, DEFAULT_INTERVAL_SECS,
    DAYS_PER_PAGE,
};
pub use error::{ConfigError, MalformedSlotError};
pub use identity::{identity_of, normalized_key, parse_start};
pub use types::{
    CycleReport, MonitoredTarget, QueryDescriptor, RawSlot, SlotIdentity, SlotSnapshotEntry,
    Snapshot,
};
