use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems, reported once at load time
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no targets configured")]
    NoTargets,

    #[error("target #{index} has an empty name")]
    EmptyTargetName { index: usize },

    #[error("target name {0:?} is used more than once")]
    DuplicateTarget(String),

    #[error("target {target:?}: invalid url: {reason}")]
    InvalidUrl { target: String, reason: String },

    #[error("target {target:?}: missing query parameter {param}")]
    MissingParameter { target: String, param: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("environment variable {var} has invalid value {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// A fetched slot whose normalized identity fields could not be derived
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSlotError {
    #[error("slot has no start timestamp")]
    MissingStart,

    #[error("slot start {raw:?} is not a recognised timestamp")]
    UnparseableStart { raw: String },
}
