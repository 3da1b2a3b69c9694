use slotwatch_telemetry::{record_cycle, Paths};
use std::path::Path;
use tracing::{info, warn};

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = super::load_config(&paths, config_path)?;
    let engine = super::build_engine(&paths, &config)?;

    info!(
        targets = config.targets.len(),
        interval_secs = config.interval.as_secs(),
        days = config.days_to_check,
        notifier = ?config.notifier,
        "starting slot watcher"
    );

    let runtime = super::runtime()?;
    let cycles = runtime.block_on(engine.run_forever(
        config.interval,
        shutdown_signal(),
        |report| {
            if let Err(e) = record_cycle(&paths, report) {
                warn!(error = %e, "failed to append cycle history");
            }
        },
    ))?;

    println!("Stopped after {} cycles", cycles);
    Ok(())
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
