//! Path resolution for slotwatch state files

use std::path::{Path, PathBuf};

const HOME_ENV: &str = "SLOTWATCH_HOME";

/// Resolves standard paths under the slotwatch data directory
#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
}

impl Paths {
    /// `$SLOTWATCH_HOME`, else the platform data directory plus `slotwatch`
    pub fn new() -> std::io::Result<Self> {
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(PathBuf::from(dir)));
        }

        let base = dirs::data_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "data directory not found")
        })?;
        Ok(Self::at(base.join("slotwatch")))
    }

    /// Paths rooted at an explicit directory
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.data_dir
    }

    /// Dedup store database
    pub fn db_file(&self) -> PathBuf {
        self.data_dir.join("slots.db")
    }

    /// Cycle history log
    pub fn cycles_file(&self) -> PathBuf {
        self.data_dir.join("cycles.jsonl")
    }

    /// Config file used when `--config` is not given
    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }
}
