pub mod check_config;
pub mod evict;
pub mod history;
pub mod init;
pub mod once;
pub mod run;
pub mod status;
pub mod version;

use anyhow::Context;
use slotwatch_core::Config;
use slotwatch_engine::Engine;
use slotwatch_http::{build_dispatcher, AvailabilityFetcher};
use slotwatch_store::DedupStore;
use slotwatch_telemetry::Paths;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// `--config` if given, else `config.json` in the data directory
fn config_path(paths: &Paths, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file())
}

fn load_config(paths: &Paths, explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = config_path(paths, explicit);
    Config::load(&path).with_context(|| {
        format!(
            "failed to load config from {} (run `slotwatch init` to create one)",
            path.display()
        )
    })
}

fn open_store(paths: &Paths) -> anyhow::Result<Arc<DedupStore>> {
    let path = paths.db_file();
    let store = DedupStore::open(&path)
        .with_context(|| format!("failed to open dedup store at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn build_engine(paths: &Paths, config: &Config) -> anyhow::Result<Engine> {
    let store = open_store(paths)?;
    let fetcher = AvailabilityFetcher::new(config.days_to_check, config.fetch_timeout)?;
    let dispatcher = build_dispatcher(&config.notifier, config.dispatch_timeout)?;
    Ok(Engine::from_config(
        config,
        store,
        Arc::new(fetcher),
        dispatcher,
    ))
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
