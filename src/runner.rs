//! One scan cycle: walk the result pages, persist what was found, then drive
//! the wizard for every eligible record that has not been submitted yet.
//! Process-level looping and scheduling live outside this crate.

use crate::config::AutomationConfig;
use crate::diagnostics::DiagnosticsRecorder;
use crate::errors::AutomationError;
use crate::pagination::PaginationWalker;
use crate::session::Session;
use crate::storage::{AuditSink, RecordRepository, StepAuditEntry};
use crate::wizard::{WizardEngine, WizardOutcome};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Audit step name for a record whose page could not be reached at all.
/// Part of the same stable contract as the wizard step names.
pub const STEP_NAVIGATION_FAILED: &str = "navigation_failed";

/// Counters for one completed cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub pages: usize,
    pub records: usize,
    pub submitted: usize,
    pub aborted: usize,
}

/// Glues the walker, repository and wizard together for one cycle.
pub struct CycleRunner {
    session: Session,
    repository: Arc<dyn RecordRepository>,
    audit: Arc<dyn AuditSink>,
    config: AutomationConfig,
}

impl CycleRunner {
    pub fn new(
        session: Session,
        repository: Arc<dyn RecordRepository>,
        audit: Arc<dyn AuditSink>,
        config: AutomationConfig,
    ) -> Self {
        Self {
            session,
            repository,
            audit,
            config,
        }
    }

    /// Scan all pages, upsert every extracted record, then process records
    /// one wizard session at a time. Per-record and per-page failures never
    /// abort the cycle; only an unusable browser session does.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleSummary, AutomationError> {
        let mut summary = CycleSummary::default();

        let walker = PaginationWalker::new(self.session.engine(), self.config.clone());
        let repository = self.repository.clone();
        let walk = walker
            .walk_all(|batch| {
                let repository = repository.clone();
                async move {
                    for record in &batch {
                        // Persistence faults are logged and the scan keeps
                        // going in memory; the next cycle re-scrapes anyway.
                        if let Err(e) = repository.upsert_listing(record).await {
                            warn!(url = %record.target_url, error = %e, "upsert failed");
                        }
                    }
                }
            })
            .await?;
        summary.pages = walk.pages;
        summary.records = walk.records;

        let pending = self.repository.eligible_unsubmitted().await?;
        info!(pending = pending.len(), "processing unsubmitted records");

        let diagnostics = DiagnosticsRecorder::new(
            self.session.engine(),
            self.config.diagnostics_dir.clone(),
        );
        let wizard = WizardEngine::new(
            self.session.engine(),
            self.audit.clone(),
            diagnostics,
            self.config.clone(),
        );

        for target_url in pending {
            if let Err(e) = self.session.navigate(&target_url).await {
                warn!(url = %target_url, error = %e, "navigation failed, skipping record");
                // Even a record that never rendered gets its audit row.
                let entry = StepAuditEntry::failed(
                    &target_url,
                    STEP_NAVIGATION_FAILED,
                    format!("navigation failed: {e}"),
                );
                if let Err(e) = self.audit.append_step(entry).await {
                    warn!(error = %e, "audit sink append failed");
                }
                summary.aborted += 1;
                continue;
            }

            match wizard.run(&target_url).await? {
                WizardOutcome::Done { via_fallback } => {
                    info!(url = %target_url, via_fallback, "record submitted");
                    // The single submitted=false → true transition, only ever
                    // taken on Done.
                    if let Err(e) = self.repository.mark_submitted(&target_url, Utc::now()).await {
                        warn!(url = %target_url, error = %e, "mark_submitted failed");
                    }
                    summary.submitted += 1;
                }
                WizardOutcome::Aborted { reason } => {
                    info!(url = %target_url, ?reason, "record left for a future cycle");
                    summary.aborted += 1;
                }
            }
        }

        info!(?summary, "cycle finished");
        Ok(summary)
    }
}
