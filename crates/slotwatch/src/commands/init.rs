use slotwatch_core::Config;
use slotwatch_telemetry::{atomic_write, Paths};
use std::path::Path;

fn write_sample(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    atomic_write(path, Config::sample_json().as_bytes())?;
    Ok(())
}

pub fn run(config_path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let path = super::config_path(&paths, config_path);
    write_sample(&path, force)?;

    println!("✓ Wrote starter config to {}", path.display());
    println!("\nNext steps:");
    println!("  - Replace the sample target with your own availability URLs");
    println!("  - Pick a notifier (log, webhook or twilio)");
    println!("  - Run `slotwatch check-config`, then `slotwatch run`");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_loadable_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.json");

        write_sample(&path, false).unwrap();
        let config = Config::from_json_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.targets.len(), 1);
    }

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(write_sample(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");

        write_sample(&path, true).unwrap();
        assert!(Config::from_json_str(&std::fs::read_to_string(&path).unwrap()).is_ok());
    }
}
