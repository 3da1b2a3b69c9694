use slotwatch_telemetry::{record_cycle, Paths};
use std::path::Path;
use tracing::warn;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = super::load_config(&paths, config_path)?;
    let engine = super::build_engine(&paths, &config)?;

    let report = super::runtime()?.block_on(engine.run_one_cycle())?;
    if let Err(e) = record_cycle(&paths, &report) {
        warn!(error = %e, "failed to append cycle history");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
