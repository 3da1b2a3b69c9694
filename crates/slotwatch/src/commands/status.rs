use slotwatch_store::StoreStats;
use slotwatch_telemetry::Paths;

fn format_stats(stats: &StoreStats) -> String {
    if stats.total == 0 {
        return "Dedup store is empty".to_string();
    }

    let mut lines = vec![format!("Notified slots: {}", stats.total)];
    if let (Some(oldest), Some(newest)) = (stats.oldest_first_seen, stats.newest_first_seen) {
        lines.push(format!(
            "First seen: {} .. {}",
            oldest.format("%Y-%m-%d %H:%M"),
            newest.format("%Y-%m-%d %H:%M")
        ));
    }
    lines.push("Per target:".to_string());
    for target in &stats.per_target {
        lines.push(format!("  {:<30} {}", target.target_name, target.records));
    }
    lines.join("\n")
}

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    println!("Data directory: {}", paths.root().display());

    if !paths.db_file().exists() {
        println!("No dedup store yet");
        return Ok(());
    }

    let store = super::open_store(&paths)?;
    println!("{}", format_stats(&store.stats()?));
    Ok(())
}
