#![allow(dead_code)]

use async_trait::async_trait;
use slotwatch_core::{Config, MonitoredTarget, QueryDescriptor, RawSlot, SlotSnapshotEntry, Snapshot};
use slotwatch_engine::{DispatchError, Dispatcher, Engine, FetchError, Fetcher};
use slotwatch_store::DedupStore;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const SAMPLE_URL: &str = "https://partners.doctolib.fr/availabilities.json?visit_motive_ids=1&agenda_ids=2&practice_ids=3&telehealth=false&limit=15";

pub fn target(name: &str) -> MonitoredTarget {
    MonitoredTarget {
        display_name: name.to_string(),
        query: QueryDescriptor::from_url(name, SAMPLE_URL).unwrap(),
    }
}

pub fn sample_config(names: &[&str]) -> Config {
    let mut config = Config::new(names.iter().map(|n| target(n)).collect());
    config.evict_every_cycles = 1;
    config
}

pub fn slots(starts: &[&str]) -> Snapshot {
    starts.iter().map(|s| RawSlot::new(*s)).collect()
}

/// Serves a fixed snapshot (or error) per target name
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, Result<Snapshot, FetchError>>>,
}

impl ScriptedFetcher {
    pub fn set(&self, name: &str, response: Result<Snapshot, FetchError>) {
        self.responses
            .lock()
            .unwrap()
            .insert(name.to_string(), response);
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, target: &MonitoredTarget) -> Result<Snapshot, FetchError> {
        self.responses
            .lock()
            .unwrap()
            .get(target.name())
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Records every successful dispatch; can be switched to fail
#[derive(Default)]
pub struct RecordingDispatcher {
    delivered: Mutex<Vec<String>>,
    failing: Mutex<bool>,
}

impl RecordingDispatcher {
    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        target_name: &str,
        entry: &SlotSnapshotEntry,
    ) -> Result<(), DispatchError> {
        if *self.failing.lock().unwrap() {
            return Err(DispatchError::Rejected {
                status: 500,
                body: "upstream down".to_string(),
            });
        }
        self.delivered
            .lock()
            .unwrap()
            .push(format!("{} {}", target_name, entry.display_time()));
        Ok(())
    }
}

pub fn engine(
    config: &Config,
    db_path: &Path,
    fetcher: &Arc<ScriptedFetcher>,
    dispatcher: &Arc<RecordingDispatcher>,
) -> Engine {
    let store = Arc::new(DedupStore::open(db_path).unwrap());
    Engine::from_config(config, store, fetcher.clone(), dispatcher.clone())
}
