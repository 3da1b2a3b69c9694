//! Boundaries to the upstream availability source and the notification sink
//!
//! The engine only sees these traits, so transports can be swapped and
//! cycles can be driven by in-memory fakes in tests.

use async_trait::async_trait;
use slotwatch_core::{MonitoredTarget, SlotSnapshotEntry, Snapshot};
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a snapshot for one target. The target is skipped this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure to deliver one notification. The slot stays unrecorded and is retried next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("notification rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
}

/// Produces the currently available slots for a target
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Slots in the upstream's own order
    async fn fetch(&self, target: &MonitoredTarget) -> Result<Snapshot, FetchError>;
}

/// Emits a user-facing notification for one new slot.
///
/// Must tolerate being called again for the same slot after a failure.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &str {
        "dispatcher"
    }

    async fn dispatch(
        &self,
        target_name: &str,
        entry: &SlotSnapshotEntry,
    ) -> Result<(), DispatchError>;
}
