//! Durable slot-identity dedup store backed by SQLite

mod error;
mod store;
mod types;

pub use error::StoreError;
pub use store::DedupStore;
pub use types::{DedupRecord, RecordOutcome, StoreStats, TargetCount};
