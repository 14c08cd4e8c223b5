//! Persistence seams. The core only ever writes through these traits; it
//! never reads the audit log back, and extraction keeps going in memory when
//! persistence is unreachable.

use crate::errors::AutomationError;
use crate::listing::ListingRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// References to diagnostics snapshots captured for a step attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotRefs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl SnapshotRefs {
    pub fn is_empty(&self) -> bool {
        self.html.is_none() && self.screenshot.is_none()
    }
}

/// One row per step attempt, append-only, ordered by creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepAuditEntry {
    pub target_url: String,
    pub step_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "SnapshotRefs::is_empty")]
    pub snapshots: SnapshotRefs,
}

impl StepAuditEntry {
    pub fn ok(target_url: &str, step_name: &str) -> Self {
        Self {
            target_url: target_url.to_string(),
            step_name: step_name.to_string(),
            success: true,
            detail: None,
            snapshots: SnapshotRefs::default(),
        }
    }

    pub fn failed(target_url: &str, step_name: &str, detail: impl Into<String>) -> Self {
        Self {
            target_url: target_url.to_string(),
            step_name: step_name.to_string(),
            success: false,
            detail: Some(detail.into()),
            snapshots: SnapshotRefs::default(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_snapshots(mut self, snapshots: SnapshotRefs) -> Self {
        self.snapshots = snapshots;
        self
    }
}

/// Processing state the repository attaches to a listing. The
/// `submitted=false → true` transition happens at most once per record and is
/// never reverted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStatus {
    pub eligible: bool,
    pub submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Idempotent store of extracted listings keyed by `target_url`.
#[async_trait::async_trait]
pub trait RecordRepository: Send + Sync {
    /// Insert or update by the natural key; re-scraping the same listing is a
    /// no-op on conflict.
    async fn upsert_listing(&self, record: &ListingRecord) -> Result<(), AutomationError>;

    /// Target URLs that are eligible and not yet submitted.
    async fn eligible_unsubmitted(&self) -> Result<Vec<String>, AutomationError>;

    /// Key-conditioned, at-most-once submitted transition.
    async fn mark_submitted(
        &self,
        target_url: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AutomationError>;
}

/// Append-only step log. Best-effort: callers log and swallow failures so a
/// broken sink never masks the outcome it was recording.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn append_step(&self, entry: StepAuditEntry) -> Result<(), AutomationError>;
}
