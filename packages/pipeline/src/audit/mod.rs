// ABOUTME: Best-effort audit log for attempt outcomes
// ABOUTME: Swallows sink failures but counts them so they stay observable

mod storage;
mod types;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use adapt_config::AdaptConfig;

pub use storage::{AuditSink, MemoryAuditSink, SqliteAuditSink, MEMORY_SINK_CAPACITY};
pub use types::AuditRecord;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid audit record: {0}")]
    InvalidRecord(String),

    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),

    #[error("Audit write timed out after {0:?}")]
    Timeout(Duration),
}

/// Longest a single append may hold up the caller
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle the orchestrator writes through; never fails
#[derive(Clone)]
pub struct AuditLog {
    sink: Arc<dyn AuditSink>,
    failures: Arc<AtomicU64>,
    write_timeout: Duration,
}

impl AuditLog {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            failures: Arc::new(AtomicU64::new(0)),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// SQLite sink at `ADAPT_AUDIT_DB` when configured, in-memory otherwise
    pub async fn from_config(config: &AdaptConfig) -> Result<Self, AuditError> {
        match &config.audit_db {
            Some(path) => {
                info!("Audit log stored at {}", path.display());
                Ok(Self::new(Arc::new(SqliteAuditSink::connect(path).await?)))
            }
            None => {
                info!(capacity = MEMORY_SINK_CAPACITY, "Audit log kept in memory");
                Ok(Self::memory().0)
            }
        }
    }

    /// Audit log over a fresh in-memory sink, returned alongside for inspection
    pub fn memory() -> (Self, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        (Self::new(sink.clone()), sink)
    }

    pub async fn record(&self, record: AuditRecord) {
        let written = tokio::time::timeout(self.write_timeout, self.sink.append(&record))
            .await
            .unwrap_or(Err(AuditError::Timeout(self.write_timeout)));
        if let Err(e) = written {
            let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                failures,
                attempt = record.attempt,
                "Audit write failed, continuing: {}", e
            );
        }
    }

    /// Sink failures swallowed so far
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
