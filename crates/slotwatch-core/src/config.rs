//! Configuration for slot monitoring

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{MonitoredTarget, QueryDescriptor};

/// Days ahead to query
pub const DEFAULT_DAYS_TO_CHECK: u32 = 100;

/// Seconds between poll cycles
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Days covered by one upstream page
pub const DAYS_PER_PAGE: u32 = 15;

/// Days a dedup record is kept for a `days_to_check` window.
///
/// Covers every queried page (`ceil(days / 15) * 15` days) plus one day,
/// since pages start on the local date while `first_seen_at` is UTC.
pub fn retention_days(days_to_check: u32) -> u32 {
    days_to_check.div_ceil(DAYS_PER_PAGE) * DAYS_PER_PAGE + 1
}

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_EVICT_EVERY_CYCLES: u32 = 12;

const ENV_DAYS_TO_CHECK: &str = "DAYS_TO_CHECK";
const ENV_INTERVAL: &str = "INTERVAL_BETWEEN_CHECKS";

/// Where notifications go
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotifierConfig {
    /// Log only (dry run)
    #[default]
    Log,
    /// JSON POST to a webhook
    Webhook { url: String },
    /// SMS through Twilio; numbers fall back to `TWILIO_FROM_NUMBER` / `TWILIO_TO_NUMBER`
    Twilio {
        #[serde(default)]
        from: Option<String>,
        #[serde(default)]
        to: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    targets: Vec<TargetEntry>,
    #[serde(default)]
    days_to_check: Option<u32>,
    #[serde(default)]
    interval_secs: Option<u64>,
    #[serde(default)]
    fetch_timeout_secs: Option<u64>,
    #[serde(default)]
    dispatch_timeout_secs: Option<u64>,
    #[serde(default)]
    max_parallel_targets: Option<usize>,
    #[serde(default)]
    evict_every_cycles: Option<u32>,
    #[serde(default)]
    notifier: Option<NotifierConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetEntry {
    name: String,
    url: String,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Targets in configuration order
    pub targets: Vec<MonitoredTarget>,

    /// Days ahead the fetcher queries, rounded up to whole pages
    pub days_to_check: u32,

    /// Sleep between cycles
    pub interval: Duration,

    /// Upper bound for one page request. Pages are requested concurrently,
    /// so this also bounds one target's whole fetch.
    pub fetch_timeout: Duration,

    /// Upper bound for one notification
    pub dispatch_timeout: Duration,

    /// Targets processed concurrently (1 = sequential)
    pub max_parallel_targets: usize,

    /// Run retention cleanup every N cycles
    pub evict_every_cycles: u32,

    pub notifier: NotifierConfig,
}

impl Config {
    /// Defaults around an explicit target list
    pub fn new(targets: Vec<MonitoredTarget>) -> Self {
        Self {
            targets,
            days_to_check: DEFAULT_DAYS_TO_CHECK,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            dispatch_timeout: Duration::from_secs(DEFAULT_DISPATCH_TIMEOUT_SECS),
            max_parallel_targets: 1,
            evict_every_cycles: DEFAULT_EVICT_EVERY_CYCLES,
            notifier: NotifierConfig::Log,
        }
    }

    /// Read a JSON config file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)?.with_overrides(|var| std::env::var(var).ok())
    }

    /// Parse and validate JSON config, without environment overrides
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(contents)?;

        let mut targets = Vec::with_capacity(file.targets.len());
        let mut seen = HashSet::new();
        for (index, entry) in file.targets.into_iter().enumerate() {
            let name = entry.name.trim().to_string();
            if name.is_empty() {
                return Err(ConfigError::EmptyTargetName { index });
            }
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateTarget(name));
            }
            let query = QueryDescriptor::from_url(&name, &entry.url)?;
            targets.push(MonitoredTarget {
                display_name: name,
                query,
            });
        }

        let defaults = Self::new(Vec::new());
        let config = Self {
            targets,
            days_to_check: file.days_to_check.unwrap_or(defaults.days_to_check),
            interval: file
                .interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            fetch_timeout: file
                .fetch_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            dispatch_timeout: file
                .dispatch_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.dispatch_timeout),
            max_parallel_targets: file
                .max_parallel_targets
                .unwrap_or(defaults.max_parallel_targets),
            evict_every_cycles: file
                .evict_every_cycles
                .unwrap_or(defaults.evict_every_cycles),
            notifier: file.notifier.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `DAYS_TO_CHECK` / `INTERVAL_BETWEEN_CHECKS` from `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DAYS_TO_CHECK) {
            self.days_to_check = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_DAYS_TO_CHECK,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_INTERVAL) {
            let secs: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_INTERVAL,
                value: value.clone(),
            })?;
            self.interval = Duration::from_secs(secs);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        let positive = |field: &'static str, ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".to_string(),
                })
            }
        };
        positive("days_to_check", self.days_to_check > 0)?;
        positive("interval_secs", !self.interval.is_zero())?;
        positive("fetch_timeout_secs", !self.fetch_timeout.is_zero())?;
        positive("dispatch_timeout_secs", !self.dispatch_timeout.is_zero())?;
        positive("max_parallel_targets", self.max_parallel_targets > 0)?;
        positive("evict_every_cycles", self.evict_every_cycles > 0)?;

        if let NotifierConfig::Webhook { url } = &self.notifier {
            let parsed = url::Url::parse(url).map_err(|e| ConfigError::InvalidValue {
                field: "notifier.url",
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidValue {
                    field: "notifier.url",
                    reason: format!("unsupported scheme {}", parsed.scheme()),
                });
            }
        }
        Ok(())
    }

    /// How long a dedup record must outlive its first sighting
    pub fn horizon(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(retention_days(self.days_to_check)))
    }

    /// Number of upstream pages needed to cover `days_to_check`
    pub fn page_count(&self) -> u32 {
        self.days_to_check.div_ceil(DAYS_PER_PAGE)
    }

    /// Starter config written by `slotwatch init`
    pub fn sample_json() -> String {
        let sample = serde_json::json!({
            "targets": [
                {
                    "name": "John Smith",
                    "url": "https://partners.doctolib.fr/availabilities.json?visit_motive_ids=1&agenda_ids=1&practice_ids=1&telehealth=false&limit=15"
                }
            ],
            "days_to_check": DEFAULT_DAYS_TO_CHECK,
            "interval_secs": DEFAULT_INTERVAL_SECS,
            "fetch_timeout_secs": DEFAULT_FETCH_TIMEOUT_SECS,
            "dispatch_timeout_secs": DEFAULT_DISPATCH_TIMEOUT_SECS,
            "max_parallel_targets": 1,
            "evict_every_cycles": DEFAULT_EVICT_EVERY_CYCLES,
            "notifier": { "kind": "log" }
        });
        serde_json::to_string_pretty(&sample).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config_json(extra: &str) -> String {
        format!(
            r#"{{
                "targets": [
                    {{"name": "John Smith", "url": "https://partners.doctolib.fr/availabilities.json?visit_motive_ids=1&agenda_ids=1&practice_ids=1&telehealth=false&start_date=2025-06-02&limit=15"}},
                    {{"name": "Jane Doe", "url": "https://www.doctolib.fr/availabilities.json?visit_motive_ids=2&agenda_ids=5&practice_ids=9"}}
                ]{extra}
            }}"#
        )
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_json_str(&config_json("")).unwrap();
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].name(), "John Smith");
        assert_eq!(config.targets[1].name(), "Jane Doe");
        assert_eq!(config.days_to_check, 100);
        assert_eq!(config.interval, Duration::from_secs(300));
        assert_eq!(config.max_parallel_targets, 1);
        assert_eq!(config.notifier, NotifierConfig::Log);
        assert_eq!(config.page_count(), 7);
        assert_eq!(config.horizon(), chrono::Duration::days(106));
    }

    #[test]
    fn test_horizon_covers_every_queried_page() {
        for days in [1, 14, 15, 16, 30, 100, 365] {
            let mut config = Config::new(Vec::new());
            config.days_to_check = days;
            let covered = i64::from(config.page_count() * DAYS_PER_PAGE);
            assert!(config.horizon() > chrono::Duration::days(covered), "days={days}");
        }
        assert_eq!(retention_days(15), 16);
        assert_eq!(retention_days(16), 31);
    }

    #[test]
    fn test_config_explicit_values() {
        let config = Config::from_json_str(&config_json(
            r#", "days_to_check": 30, "interval_secs": 60, "max_parallel_targets": 4,
                 "notifier": {"kind": "webhook", "url": "https://hooks.example.com/slots"}"#,
        ))
        .unwrap();
        assert_eq!(config.days_to_check, 30);
        assert_eq!(config.page_count(), 2);
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.max_parallel_targets, 4);
        assert_eq!(
            config.notifier,
            NotifierConfig::Webhook {
                url: "https://hooks.example.com/slots".to_string()
            }
        );
    }

    #[test]
    fn test_config_rejects_duplicates_and_gaps() {
        let dup = r#"{"targets": [
            {"name": "A", "url": "https://x.test/a.json?visit_motive_ids=1&agenda_ids=1&practice_ids=1"},
            {"name": "A", "url": "https://x.test/a.json?visit_motive_ids=2&agenda_ids=2&practice_ids=2"}
        ]}"#;
        assert!(matches!(
            Config::from_json_str(dup),
            Err(ConfigError::DuplicateTarget(name)) if name == "A"
        ));

        let incomplete =
            r#"{"targets": [{"name": "A", "url": "https://x.test/a.json?visit_motive_ids=1"}]}"#;
        assert!(matches!(
            Config::from_json_str(incomplete),
            Err(ConfigError::MissingParameter { .. })
        ));

        assert!(matches!(
            Config::from_json_str(r#"{"targets": []}"#),
            Err(ConfigError::NoTargets)
        ));

        assert!(matches!(
            Config::from_json_str(&config_json(r#", "interval_secs": 0"#)),
            Err(ConfigError::InvalidValue { field: "interval_secs", .. })
        ));
    }

    #[test]
    fn test_config_unknown_field_is_error() {
        assert!(matches!(
            Config::from_json_str(&config_json(r#", "intervall": 5"#)),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_json_str(&config_json(""))
            .unwrap()
            .with_overrides(|var| match var {
                "DAYS_TO_CHECK" => Some("45".to_string()),
                "INTERVAL_BETWEEN_CHECKS" => Some("120".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.days_to_check, 45);
        assert_eq!(config.page_count(), 3);
        assert_eq!(config.interval, Duration::from_secs(120));

        let bad = Config::from_json_str(&config_json(""))
            .unwrap()
            .with_overrides(|var| (var == "DAYS_TO_CHECK").then(|| "soon".to_string()));
        assert!(matches!(bad, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    #[serial]
    fn test_load_reads_file_and_env() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("slotwatch.json");
        std::fs::write(&path, config_json("")).unwrap();

        unsafe { std::env::set_var("DAYS_TO_CHECK", "20") };
        let loaded = Config::load(&path);
        unsafe { std::env::remove_var("DAYS_TO_CHECK") };

        assert_eq!(loaded.unwrap().days_to_check, 20);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/slotwatch.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_sample_json_is_valid() {
        let config = Config::from_json_str(&Config::sample_json()).unwrap();
        assert_eq!(config.targets.len(), 1);
    }
}
