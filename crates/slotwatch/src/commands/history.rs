use slotwatch_core::CycleReport;
use slotwatch_telemetry::{read_cycles, CycleStats, Paths};

fn format_cycle(report: &CycleReport) -> String {
    let mut line = format!(
        "#{:<5} {}  targets {} ({} failed)  new {}  sent {}",
        report.cycle,
        report.started_at.format("%Y-%m-%d %H:%M:%S"),
        report.targets_processed,
        report.targets_failed,
        report.new_slots_found,
        report.notifications_sent,
    );
    if report.notifications_failed > 0 {
        line.push_str(&format!("  undelivered {}", report.notifications_failed));
    }
    if let Some(evicted) = report.evicted {
        line.push_str(&format!("  evicted {}", evicted));
    }
    line
}

fn compute_stats(reports: &[CycleReport]) -> String {
    if reports.is_empty() {
        return "No cycles to analyze.".to_string();
    }
    let stats = CycleStats::from_reports(reports);
    let delivery = match stats.delivery_rate() {
        -1 => "n/a".to_string(),
        rate => format!("{}%", rate),
    };

    format!(
        "Total cycles: {}\n\
         Target failures: {}\n\
         New slots: {}\n\
         Notifications sent: {}\n\
         Notifications failed: {}\n\
         Delivery rate: {}\n\
         Malformed entries: {}\n\
         Records evicted: {}",
        stats.cycles,
        stats.target_failures,
        stats.new_slots_found,
        stats.notifications_sent,
        stats.notifications_failed,
        delivery,
        stats.malformed_entries,
        stats.evicted
    )
}

pub fn run(stats: bool, limit: usize) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let reports = read_cycles(&paths)?;

    if reports.is_empty() {
        println!("No cycle history");
        return Ok(());
    }

    if stats {
        println!("{}", compute_stats(&reports));
        return Ok(());
    }

    let recent: Vec<&CycleReport> = reports.iter().rev().take(limit).collect();
    println!("Recent Cycles (last {})", recent.len());
    for report in recent.into_iter().rev() {
        println!("{}", format_cycle(report));
    }
    Ok(())
}
