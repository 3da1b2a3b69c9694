//! Change detection and exactly-once notification engine

mod diff;
mod engine;
mod ports;
mod retention;

pub use diff::{diff, DiffOutcome};
pub use engine::{Engine, EngineSettings};
pub use ports::{DispatchError, Dispatcher, FetchError, Fetcher};
pub use retention::{eviction_cutoff, EvictionSchedule};
