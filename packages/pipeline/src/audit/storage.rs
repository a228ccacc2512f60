// ABOUTME: Audit sinks backed by SQLite or process memory
// ABOUTME: Appends records to the error_log table and reads them back for inspection

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::types::AuditRecord;
use super::AuditError;

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

pub struct SqliteAuditSink {
    pool: SqlitePool,
}

impl SqliteAuditSink {
    /// Wrap an existing pool; call `init` before first use
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `path`
    pub async fn connect(path: &Path) -> Result<Self, AuditError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let sink = Self::new(pool);
        sink.init().await?;
        Ok(sink)
    }

    /// Private in-memory database, mostly for tests
    pub async fn in_memory() -> Result<Self, AuditError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let sink = Self::new(pool);
        sink.init().await?;
        Ok(sink)
    }

    pub async fn init(&self) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS error_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                component_id TEXT,
                error_message TEXT NOT NULL,
                fix_summary TEXT NOT NULL,
                success INTEGER NOT NULL,
                attempt INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent `limit` records, oldest first
    pub async fn list_records(&self, limit: i64) -> Result<Vec<AuditRecord>, AuditError> {
        let rows = sqlx::query(
            r#"
            SELECT component_id, error_message, fix_summary, success, attempt, created_at
            FROM (SELECT * FROM error_log ORDER BY id DESC LIMIT ?)
            ORDER BY id ASC
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let created_at: String = row.try_get("created_at")?;
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| AuditError::InvalidRecord(e.to_string()))?
                    .with_timezone(&Utc);
                let attempt: i64 = row.try_get("attempt")?;

                Ok(AuditRecord {
                    component_id: row.try_get("component_id")?,
                    error_message: row.try_get("error_message")?,
                    fix_summary: row.try_get("fix_summary")?,
                    success: row.try_get("success")?,
                    attempt: u32::try_from(attempt)
                        .map_err(|e| AuditError::InvalidRecord(e.to_string()))?,
                    created_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO error_log (
                component_id, error_message, fix_summary, success, attempt, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.component_id)
        .bind(&record.error_message)
        .bind(&record.fix_summary)
        .bind(record.success)
        .bind(i64::from(record.attempt))
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(attempt = record.attempt, success = record.success, "Audit record stored");
        Ok(())
    }
}

/// Records a long-running process keeps in memory before dropping the oldest
pub const MEMORY_SINK_CAPACITY: usize = 1000;

/// In-process sink whose most recent records can be inspected
#[derive(Debug)]
pub struct MemoryAuditSink {
    records: Mutex<VecDeque<AuditRecord>>,
    capacity: usize,
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::with_capacity(MEMORY_SINK_CAPACITY)
    }
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
        }
    }

    /// Retained records, oldest first
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sqlite_roundtrip_preserves_order() {
        let sink = SqliteAuditSink::in_memory().await.unwrap();
        let first = AuditRecord::new(1, "Missing default export", "autofix attempt 1 failed", false);
        let second = AuditRecord::new(2, "validator issues", "autofix attempt 2 succeeded", true)
            .with_component_id("cmp-1");

        sink.append(&first).await.unwrap();
        sink.append(&second).await.unwrap();

        let records = sink.list_records(10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fix_summary, "autofix attempt 1 failed");
        assert!(!records[0].success);
        assert_eq!(records[1].component_id.as_deref(), Some("cmp-1"));
        assert_eq!(records[1].attempt, 2);
        assert_eq!(records[1].created_at.timestamp(), second.created_at.timestamp());
    }

    #[tokio::test]
    async fn test_sqlite_file_is_created_and_reopened() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("audit.db");

        {
            let sink = SqliteAuditSink::connect(&db_path).await.unwrap();
            sink.append(&AuditRecord::new(0, "x", "initial render succeeded", true))
                .await
                .unwrap();
        }

        let reopened = SqliteAuditSink::connect(&db_path).await.unwrap();
        let records = reopened.list_records(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_list_limit_keeps_latest() {
        let sink = SqliteAuditSink::in_memory().await.unwrap();
        for attempt in 1..=4 {
            sink.append(&AuditRecord::new(attempt, "e", format!("attempt {}", attempt), false))
                .await
                .unwrap();
        }

        let records = sink.list_records(2).await.unwrap();
        let attempts: Vec<u32> = records.iter().map(|r| r.attempt).collect();
        assert_eq!(attempts, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_memory_sink() {
        let sink = MemoryAuditSink::new();
        sink.append(&AuditRecord::new(1, "e", "s", false)).await.unwrap();
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_sink_drops_oldest_past_capacity() {
        let sink = MemoryAuditSink::with_capacity(3);
        for attempt in 1..=5 {
            sink.append(&AuditRecord::new(attempt, "e", "s", false))
                .await
                .unwrap();
        }

        let attempts: Vec<u32> = sink.records().iter().map(|r| r.attempt).collect();
        assert_eq!(attempts, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_default_memory_sink_is_bounded() {
        let sink = MemoryAuditSink::new();
        for _ in 0..MEMORY_SINK_CAPACITY + 10 {
            sink.append(&AuditRecord::new(1, "e", "s", false)).await.unwrap();
        }
        assert_eq!(sink.records().len(), MEMORY_SINK_CAPACITY);
    }
}
