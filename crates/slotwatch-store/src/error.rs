use std::path::PathBuf;
use thiserror::Error;

/// Storage failures. Any of these means dedup guarantees cannot be kept.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    #[error("cannot prepare store directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt dedup record: {0}")]
    Corrupt(String),
}
