//! Core types for slot monitoring

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::ConfigError;

/// Parameters identifying which remote availability resource to query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Endpoint without query string, e.g. `https://www.doctolib.fr/availabilities.json`
    pub endpoint: String,
    pub visit_motive_ids: String,
    pub agenda_ids: String,
    pub practice_ids: String,
    pub telehealth: bool,
    /// Page size requested from the upstream
    pub limit: Option<u32>,
    /// Any other query parameters, preserved in their original order
    #[serde(default)]
    pub extra: Vec<(String, String)>,
}

impl QueryDescriptor {
    /// Parse an availability URL into a typed descriptor.
    ///
    /// `start_date` is dropped: the fetcher supplies it per page.
    pub fn from_url(target: &str, raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            target: target.to_string(),
            reason,
        };

        let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }

        let mut visit_motive_ids = None;
        let mut agenda_ids = None;
        let mut practice_ids = None;
        let mut telehealth = false;
        let mut limit = None;
        let mut extra = Vec::new();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "visit_motive_ids" => visit_motive_ids = Some(value.into_owned()),
                "agenda_ids" => agenda_ids = Some(value.into_owned()),
                "practice_ids" => practice_ids = Some(value.into_owned()),
                "telehealth" => telehealth = value == "true",
                "limit" => {
                    let parsed = value
                        .parse::<u32>()
                        .map_err(|_| invalid(format!("limit {value:?} is not a number")))?;
                    limit = Some(parsed);
                }
                "start_date" => {}
                _ => extra.push((key.into_owned(), value.into_owned())),
            }
        }

        let require = |value: Option<String>, param: &'static str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingParameter {
                    target: target.to_string(),
                    param,
                })
        };

        let mut endpoint = url.clone();
        endpoint.set_query(None);
        endpoint.set_fragment(None);

        Ok(Self {
            endpoint: endpoint.to_string(),
            visit_motive_ids: require(visit_motive_ids, "visit_motive_ids")?,
            agenda_ids: require(agenda_ids, "agenda_ids")?,
            practice_ids: require(practice_ids, "practice_ids")?,
            telehealth,
            limit,
            extra,
        })
    }

    /// Build the request URL for a page starting at `start_date`
    pub fn url_for(&self, start_date: NaiveDate) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("visit_motive_ids", &self.visit_motive_ids)
            .append_pair("agenda_ids", &self.agenda_ids)
            .append_pair("practice_ids", &self.practice_ids)
            .append_pair("telehealth", if self.telehealth { "true" } else { "false" });
        for (key, value) in &self.extra {
            query.append_pair(key, value);
        }
        query.append_pair("start_date", &start_date.format("%Y-%m-%d").to_string());
        if let Some(limit) = self.limit {
            query.append_pair("limit", &limit.to_string());
        }
        format!("{}?{}", self.endpoint, query.finish())
    }
}

/// A configured monitoring subject. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredTarget {
    pub display_name: String,
    pub query: QueryDescriptor,
}

impl MonitoredTarget {
    pub fn name(&self) -> &str {
        &self.display_name
    }
}

/// Canonical key for one appointment opportunity: 256-bit SHA-256, lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotIdentity(String);

impl SlotIdentity {
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        SlotIdentity(hex::encode(digest))
    }

    /// Rebuild an identity from its stored hex form
    pub fn from_hex(s: &str) -> Option<Self> {
        let valid = s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| SlotIdentity(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars, for log lines
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl TryFrom<String> for SlotIdentity {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s).ok_or_else(|| format!("invalid slot identity: {s:?}"))
    }
}

impl From<SlotIdentity> for String {
    fn from(identity: SlotIdentity) -> Self {
        identity.0
    }
}

impl fmt::Display for SlotIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw availability record as returned by a fetcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSlot {
    /// Start timestamp exactly as the upstream sent it
    pub start: String,
    /// Distinguishes offers at the same instant for one target (agenda id)
    #[serde(default)]
    pub sub_id: Option<String>,
    /// Upstream payload, used for notification content only
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl RawSlot {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            sub_id: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sub_id = Some(sub_id.into());
        self
    }
}

/// Ordered slots returned by one fetch for one target
pub type Snapshot = Vec<RawSlot>;

/// A snapshot entry with its derived identity
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSnapshotEntry {
    pub slot_identity: SlotIdentity,
    /// Start instant in the offset the upstream used
    pub scheduled_at: DateTime<FixedOffset>,
    pub sub_id: Option<String>,
    pub raw_metadata: serde_json::Value,
}

impl SlotSnapshotEntry {
    /// `YYYY-MM-DD HH:MM` in the slot's own offset
    pub fn display_time(&self) -> String {
        self.scheduled_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Counters for one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub targets_processed: usize,
    pub targets_failed: usize,
    /// New entries this process actually attempted to dispatch
    pub new_slots_found: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    #[serde(default)]
    pub malformed_entries: usize,
    #[serde(default)]
    pub duplicates_suppressed: usize,
    /// Records removed by retention cleanup, when it ran this cycle
    #[serde(default)]
    pub evicted: Option<usize>,
}
