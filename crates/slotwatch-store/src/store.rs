use crate::{DedupRecord, RecordOutcome, StoreError, StoreStats, TargetCount};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use slotwatch_core::SlotIdentity;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How long a statement waits on a lock held by another connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Durable map from slot identity to first-seen metadata.
///
/// One SQLite connection behind a mutex: calls from concurrent tasks are
/// serialized, and every write is a single autocommit statement with
/// `synchronous=FULL`, so it is on disk when the call returns.
pub struct DedupStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl DedupStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.execute_batch("PRAGMA synchronous = FULL;")?;
        Self::init_schema(&conn)?;

        tracing::debug!(path = %db_path.display(), journal_mode = %mode, "opened dedup store");
        Ok(Self {
            conn: Mutex::new(conn),
            path: db_path.to_path_buf(),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS dedup_records (
                slot_identity TEXT PRIMARY KEY,
                target_name TEXT NOT NULL,
                first_seen_at TEXT NOT NULL
            ) WITHOUT ROWID;
            CREATE INDEX IF NOT EXISTS idx_first_seen ON dedup_records(first_seen_at);
            ",
        )?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // A panic while holding the lock cannot leave a half-applied statement behind
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn exists(&self, identity: &SlotIdentity) -> Result<bool, StoreError> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM dedup_records WHERE slot_identity = ?1",
                params![identity.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Atomic insert-if-absent. An existing row is left untouched.
    pub fn record(
        &self,
        identity: &SlotIdentity,
        target_name: &str,
        first_seen_at: DateTime<Utc>,
    ) -> Result<RecordOutcome, StoreError> {
        let inserted = self.conn().execute(
            "INSERT INTO dedup_records (slot_identity, target_name, first_seen_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(slot_identity) DO NOTHING",
            params![identity.as_str(), target_name, encode_ts(first_seen_at)],
        )?;

        Ok(if inserted == 1 {
            RecordOutcome::Inserted
        } else {
            RecordOutcome::AlreadyPresent
        })
    }

    /// Delete every record first seen strictly before `cutoff`
    pub fn evict_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let removed = self.conn().execute(
            "DELETE FROM dedup_records WHERE first_seen_at < ?1",
            params![encode_ts(cutoff)],
        )?;
        Ok(removed)
    }

    pub fn get(&self, identity: &SlotIdentity) -> Result<Option<DedupRecord>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT slot_identity, target_name, first_seen_at
             FROM dedup_records WHERE slot_identity = ?1",
        )?;
        let mut rows = stmt.query(params![identity.as_str()])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_record(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM dedup_records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let conn = self.conn();
        let (total, oldest, newest): (i64, Option<String>, Option<String>) = conn.query_row(
            "SELECT COUNT(*), MIN(first_seen_at), MAX(first_seen_at) FROM dedup_records",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT target_name, COUNT(*) FROM dedup_records
             GROUP BY target_name ORDER BY target_name",
        )?;
        let per_target = stmt
            .query_map([], |row| {
                Ok(TargetCount {
                    target_name: row.get(0)?,
                    records: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StoreStats {
            total: total as usize,
            oldest_first_seen: oldest.as_deref().map(decode_ts).transpose()?,
            newest_first_seen: newest.as_deref().map(decode_ts).transpose()?,
            per_target,
        })
    }

    /// Release the connection, reporting any error from closing it.
    /// Dropping the store also releases it.
    pub fn close(self) -> Result<(), StoreError> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| StoreError::Unavailable(e))
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> Result<DedupRecord, StoreError> {
        let raw_identity: String = row.get(0)?;
        let slot_identity = SlotIdentity::from_hex(&raw_identity)
            .ok_or_else(|| StoreError::Corrupt(format!("bad identity {raw_identity:?}")))?;
        Ok(DedupRecord {
            slot_identity,
            target_name: row.get(1)?,
            first_seen_at: decode_ts(&row.get::<_, String>(2)?)?,
            notified: true,
        })
    }
}

// Fixed-width UTC text so SQL string comparison matches time order
fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_ts(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {raw:?}: {e}")))
}
