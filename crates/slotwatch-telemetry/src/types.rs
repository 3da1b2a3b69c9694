//! Cycle history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slotwatch_core::CycleReport;

use crate::io::{append_jsonl, read_jsonl};
use crate::paths::Paths;

/// Append a finished cycle to the history log
pub fn record_cycle(paths: &Paths, report: &CycleReport) -> std::io::Result<()> {
    append_jsonl(&paths.cycles_file(), report)
}

/// All recorded cycles, oldest first
pub fn read_cycles(paths: &Paths) -> std::io::Result<Vec<CycleReport>> {
    read_jsonl(&paths.cycles_file())
}

/// Aggregate over a set of cycle reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    pub cycles: usize,
    pub first_cycle_at: Option<DateTime<Utc>>,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub target_failures: usize,
    pub new_slots_found: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub malformed_entries: usize,
    pub evicted: usize,
}

impl CycleStats {
    pub fn from_reports(reports: &[CycleReport]) -> Self {
        let mut stats = CycleStats {
            cycles: reports.len(),
            first_cycle_at: reports.iter().map(|r| r.started_at).min(),
            last_cycle_at: reports.iter().map(|r| r.finished_at).max(),
            ..Default::default()
        };
        for report in reports {
            stats.target_failures += report.targets_failed;
            stats.new_slots_found += report.new_slots_found;
            stats.notifications_sent += report.notifications_sent;
            stats.notifications_failed += report.notifications_failed;
            stats.malformed_entries += report.malformed_entries;
            stats.evicted += report.evicted.unwrap_or(0);
        }
        stats
    }

    /// Share of attempted notifications that went out, in percent; -1 with no attempts
    pub fn delivery_rate(&self) -> i32 {
        let attempted = self.notifications_sent + self.notifications_failed;
        if attempted == 0 {
            return -1;
        }
        (self.notifications_sent as f64 / attempted as f64 * 100.0) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report(cycle: u64, sent: usize, failed: usize, evicted: Option<usize>) -> CycleReport {
        let started_at = Utc.with_ymd_and_hms(2025, 6, 1, 10, cycle as u32, 0).unwrap();
        CycleReport {
            cycle,
            started_at,
            finished_at: started_at + chrono::Duration::seconds(3),
            targets_processed: 2,
            targets_failed: 1,
            new_slots_found: sent + failed,
            notifications_sent: sent,
            notifications_failed: failed,
            malformed_entries: 0,
            duplicates_suppressed: 0,
            evicted,
        }
    }

    #[test]
    fn test_record_and_read_cycles() {
        let temp = tempfile::TempDir::new().unwrap();
        let paths = Paths::at(temp.path());

        record_cycle(&paths, &report(1, 2, 0, Some(0))).unwrap();
        record_cycle(&paths, &report(2, 0, 1, None)).unwrap();

        let cycles = read_cycles(&paths).unwrap();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].cycle, 1);
        assert_eq!(cycles[1].notifications_failed, 1);
    }

    #[test]
    fn test_stats() {
        let reports = vec![report(1, 3, 1, Some(4)), report(2, 0, 0, None)];
        let stats = CycleStats::from_reports(&reports);
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.target_failures, 2);
        assert_eq!(stats.notifications_sent, 3);
        assert_eq!(stats.notifications_failed, 1);
        assert_eq!(stats.evicted, 4);
        assert_eq!(stats.delivery_rate(), 75);
        assert_eq!(stats.first_cycle_at, Some(reports[0].started_at));
        assert_eq!(stats.last_cycle_at, Some(reports[1].finished_at));
    }

    #[test]
    fn test_stats_empty() {
        let stats = CycleStats::from_reports(&[]);
        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.delivery_rate(), -1);
    }
}
