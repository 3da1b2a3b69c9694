use chrono::{Local, NaiveDate};
use slotwatch_core::{Config, NotifierConfig};
use slotwatch_http::page_starts;
use slotwatch_telemetry::Paths;
use std::path::Path;

fn describe(config: &Config, today: NaiveDate) -> String {
    let notifier = match &config.notifier {
        NotifierConfig::Log => "log".to_string(),
        NotifierConfig::Webhook { url } => format!("webhook {}", url),
        NotifierConfig::Twilio { .. } => "twilio sms".to_string(),
    };

    let mut lines = vec![
        format!("Targets: {}", config.targets.len()),
        format!(
            "Window: {} days in {} pages",
            config.days_to_check,
            config.page_count()
        ),
        format!("Interval: {}s", config.interval.as_secs()),
        format!("Notifier: {}", notifier),
    ];
    let starts = page_starts(today, config.days_to_check);
    for target in &config.targets {
        lines.push(format!("\n{}", target.name()));
        for start in &starts {
            lines.push(format!("  {}", target.query.url_for(*start)));
        }
    }
    lines.join("\n")
}

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = super::load_config(&paths, config_path)?;

    println!("✓ Config is valid");
    println!("{}", describe(&config, Local::now().date_naive()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_lists_pages_per_target() {
        let config = Config::from_json_str(
            r#"{
                "targets": [
                    {"name": "Dr A", "url": "https://partners.doctolib.fr/availabilities.json?visit_motive_ids=1&agenda_ids=2&practice_ids=3"}
                ],
                "days_to_check": 20
            }"#,
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let text = describe(&config, today);

        assert!(text.contains("Window: 20 days in 2 pages"));
        assert!(text.contains("Notifier: log"));
        assert!(text.contains("start_date=2025-06-02"));
        assert!(text.contains("start_date=2025-06-17"));
    }
}
