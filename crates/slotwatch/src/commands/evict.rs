use chrono::Utc;
use slotwatch_core::{retention_days, Config, DEFAULT_DAYS_TO_CHECK};
use slotwatch_engine::eviction_cutoff;
use slotwatch_telemetry::Paths;
use std::path::Path;

/// `--days` wins, then the retention window for the config's
/// `days_to_check`, then the one for the default window
fn resolve_days(explicit: Option<u32>, config: Option<&Config>) -> anyhow::Result<u32> {
    let days = explicit.unwrap_or_else(|| {
        retention_days(config.map_or(DEFAULT_DAYS_TO_CHECK, |c| c.days_to_check))
    });
    if days == 0 {
        anyhow::bail!("--days must be greater than zero");
    }
    Ok(days)
}

pub fn run(config_path: Option<&Path>, days: Option<u32>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    if !paths.db_file().exists() {
        println!("No dedup store yet");
        return Ok(());
    }

    let config = if days.is_none() && super::config_path(&paths, config_path).exists() {
        Some(super::load_config(&paths, config_path)?)
    } else {
        None
    };
    let days = resolve_days(days, config.as_ref())?;

    let store = super::open_store(&paths)?;
    let cutoff = eviction_cutoff(Utc::now(), chrono::Duration::days(i64::from(days)));
    let removed = store.evict_older_than(cutoff)?;

    println!(
        "Evicted {} records first seen before {} ({} remaining)",
        removed,
        cutoff.format("%Y-%m-%d %H:%M"),
        store.len()?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_days(days: u32) -> Config {
        let mut config = Config::new(Vec::new());
        config.days_to_check = days;
        config
    }

    #[test]
    fn test_explicit_days_win() {
        let config = config_with_days(60);
        assert_eq!(resolve_days(Some(7), Some(&config)).unwrap(), 7);
    }

    #[test]
    fn test_falls_back_to_config_retention_then_default() {
        let config = config_with_days(60);
        assert_eq!(resolve_days(None, Some(&config)).unwrap(), 61);
        assert_eq!(
            i64::from(resolve_days(None, Some(&config)).unwrap()),
            config.horizon().num_days()
        );
        assert_eq!(resolve_days(None, None).unwrap(), 106);
    }

    #[test]
    fn test_zero_days_rejected() {
        assert!(resolve_days(Some(0), None).is_err());
    }
}
