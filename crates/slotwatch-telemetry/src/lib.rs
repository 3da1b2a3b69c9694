//! Data-directory layout, JSONL cycle history and atomic file writes

mod io;
mod paths;
mod types;

pub use io::{append_jsonl, atomic_write, read_jsonl};
pub use paths::Paths;
pub use types::{read_cycles, record_cycle, CycleStats};
