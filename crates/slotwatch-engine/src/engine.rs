//! Poll orchestration: fetch, diff, dispatch, record

use chrono::Utc;
use futures::{stream, StreamExt, TryStreamExt};
use slotwatch_core::{Config, CycleReport, MonitoredTarget, SlotIdentity, SlotSnapshotEntry};
use slotwatch_store::{DedupStore, RecordOutcome, StoreError};
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::diff::diff;
use crate::ports::{Dispatcher, Fetcher};
use crate::retention::{eviction_cutoff, EvictionSchedule};

/// Timeouts, parallelism and retention knobs for the engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub fetch_timeout: Duration,
    pub dispatch_timeout: Duration,
    pub max_parallel_targets: usize,
    pub horizon: chrono::Duration,
    pub evict_every_cycles: u32,
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout,
            dispatch_timeout: config.dispatch_timeout,
            max_parallel_targets: config.max_parallel_targets,
            horizon: config.horizon(),
            evict_every_cycles: config.evict_every_cycles,
        }
    }
}

#[derive(Debug, Default)]
struct TargetOutcome {
    fetch_failed: bool,
    new_slots: usize,
    sent: usize,
    failed: usize,
    malformed: usize,
    suppressed: usize,
}

/// Owns everything a poll cycle needs. Construct once, then drive with
/// [`Engine::run_one_cycle`] or [`Engine::run_forever`].
pub struct Engine {
    targets: Vec<MonitoredTarget>,
    store: Arc<DedupStore>,
    fetcher: Arc<dyn Fetcher>,
    dispatcher: Arc<dyn Dispatcher>,
    settings: EngineSettings,
    schedule: EvictionSchedule,
    cycles: AtomicU64,
    in_flight: Mutex<HashSet<SlotIdentity>>,
}

/// Exclusive right to dispatch one identity; released on drop
struct Claim<'a> {
    in_flight: &'a Mutex<HashSet<SlotIdentity>>,
    identity: SlotIdentity,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.identity);
    }
}

impl Engine {
    pub fn new(
        targets: Vec<MonitoredTarget>,
        store: Arc<DedupStore>,
        fetcher: Arc<dyn Fetcher>,
        dispatcher: Arc<dyn Dispatcher>,
        settings: EngineSettings,
    ) -> Self {
        let schedule = EvictionSchedule::new(settings.evict_every_cycles);
        Self {
            targets,
            store,
            fetcher,
            dispatcher,
            settings,
            schedule,
            cycles: AtomicU64::new(0),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Build from a loaded config, taking targets and settings from it
    pub fn from_config(
        config: &Config,
        store: Arc<DedupStore>,
        fetcher: Arc<dyn Fetcher>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self::new(
            config.targets.clone(),
            store,
            fetcher,
            dispatcher,
            EngineSettings::from(config),
        )
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    /// One pass over every target. Only a storage failure aborts the cycle.
    pub async fn run_one_cycle(&self) -> Result<CycleReport, StoreError> {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let started_at = Utc::now();
        debug!(cycle, targets = self.targets.len(), "cycle started");

        let outcomes: Vec<TargetOutcome> = stream::iter(self.targets.iter())
            .map(|target| self.process_target(target))
            .buffered(self.settings.max_parallel_targets.max(1))
            .try_collect()
            .await?;

        let mut report = CycleReport {
            cycle,
            started_at,
            targets_processed: outcomes.len(),
            ..Default::default()
        };
        for outcome in &outcomes {
            report.targets_failed += usize::from(outcome.fetch_failed);
            report.new_slots_found += outcome.new_slots;
            report.notifications_sent += outcome.sent;
            report.notifications_failed += outcome.failed;
            report.malformed_entries += outcome.malformed;
            report.duplicates_suppressed += outcome.suppressed;
        }

        if self.schedule.is_due(cycle) {
            report.evicted = Some(self.evict_now()?);
        }

        report.finished_at = Utc::now();
        info!(
            cycle,
            targets = report.targets_processed,
            failed_targets = report.targets_failed,
            new_slots = report.new_slots_found,
            sent = report.notifications_sent,
            failed_notifications = report.notifications_failed,
            "cycle complete"
        );
        Ok(report)
    }

    /// Retention cleanup against the configured horizon
    pub fn evict_now(&self) -> Result<usize, StoreError> {
        let cutoff = eviction_cutoff(Utc::now(), self.settings.horizon);
        let removed = self.store.evict_older_than(cutoff)?;
        if removed > 0 {
            info!(removed, cutoff = %cutoff, "evicted stale dedup records");
        }
        Ok(removed)
    }

    /// Run cycles back to back with `interval` of sleep in between until
    /// `shutdown` resolves. A cycle already running is allowed to finish.
    /// `on_cycle` sees every report. Returns the number of cycles run.
    pub async fn run_forever<S, F>(
        &self,
        interval: Duration,
        shutdown: S,
        mut on_cycle: F,
    ) -> Result<u64, StoreError>
    where
        S: Future<Output = ()>,
        F: FnMut(&CycleReport),
    {
        tokio::pin!(shutdown);
        let mut completed = 0u64;

        loop {
            let report = self.run_one_cycle().await?;
            completed += 1;
            on_cycle(&report);

            debug!(interval_secs = interval.as_secs(), "waiting for next cycle");
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(cycles = completed, "shutdown requested, stopping");
                    return Ok(completed);
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn process_target(&self, target: &MonitoredTarget) -> Result<TargetOutcome, StoreError> {
        let mut outcome = TargetOutcome::default();

        let snapshot =
            match tokio::time::timeout(self.settings.fetch_timeout, self.fetcher.fetch(target))
                .await
            {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(err)) => {
                    warn!(target = %target.name(), error = %err, "fetch failed, skipping target");
                    outcome.fetch_failed = true;
                    return Ok(outcome);
                }
                Err(_) => {
                    warn!(
                        target = %target.name(),
                        timeout_secs = self.settings.fetch_timeout.as_secs(),
                        "fetch timed out, skipping target"
                    );
                    outcome.fetch_failed = true;
                    return Ok(outcome);
                }
            };

        let changes = diff(&self.store, target, &snapshot)?;
        let detected_at = Utc::now();
        outcome.malformed = changes.malformed;

        if changes.new_entries.is_empty() {
            debug!(target = %target.name(), slots = snapshot.len(), "no new slots");
            return Ok(outcome);
        }
        info!(
            target = %target.name(),
            slots = snapshot.len(),
            new = changes.new_entries.len(),
            "new slots found"
        );

        for entry in &changes.new_entries {
            let Some(_claim) = self.claim(&entry.slot_identity) else {
                debug!(target = %target.name(), slot = %entry.slot_identity.short(), "slot in flight elsewhere");
                outcome.suppressed += 1;
                continue;
            };
            // Another target may have recorded it between our diff and our claim
            if self.store.exists(&entry.slot_identity)? {
                outcome.suppressed += 1;
                continue;
            }
            outcome.new_slots += 1;

            if self.deliver(target, entry).await {
                outcome.sent += 1;
                let recorded =
                    self.store
                        .record(&entry.slot_identity, target.name(), detected_at)?;
                if recorded == RecordOutcome::AlreadyPresent {
                    debug!(target = %target.name(), slot = %entry.slot_identity.short(), "already recorded");
                    outcome.suppressed += 1;
                }
            } else {
                outcome.failed += 1;
            }
        }

        Ok(outcome)
    }

    async fn deliver(&self, target: &MonitoredTarget, entry: &SlotSnapshotEntry) -> bool {
        let sent = tokio::time::timeout(
            self.settings.dispatch_timeout,
            self.dispatcher.dispatch(target.name(), entry),
        )
        .await;

        match sent {
            Ok(Ok(())) => {
                info!(
                    target = %target.name(),
                    slot = %entry.slot_identity.short(),
                    at = %entry.display_time(),
                    via = self.dispatcher.name(),
                    "notification sent"
                );
                true
            }
            Ok(Err(err)) => {
                warn!(
                    target = %target.name(),
                    slot = %entry.slot_identity.short(),
                    error = %err,
                    "notification failed, will retry next cycle"
                );
                false
            }
            Err(_) => {
                warn!(
                    target = %target.name(),
                    slot = %entry.slot_identity.short(),
                    timeout_secs = self.settings.dispatch_timeout.as_secs(),
                    "notification timed out, will retry next cycle"
                );
                false
            }
        }
    }

    fn claim(&self, identity: &SlotIdentity) -> Option<Claim<'_>> {
        let fresh = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.clone());
        fresh.then(|| Claim {
            in_flight: &self.in_flight,
            identity: identity.clone(),
        })
    }
}
