//! The modal wizard state machine: `Start → EntryConfirm? → Advance1 →
//! DocumentSelect? → Advance2 → Review? → Submit → Done`, with an explicit
//! `Aborted` terminal and a fallback-finalize path when the first advance
//! control cannot be found.
//!
//! Absence is asymmetric on purpose: a missing review step is an expected,
//! successful outcome, while a missing second advance control aborts the
//! record. The second advance being absent almost always means the flow has
//! mandatory questions this engine does not answer, which is a deliberate
//! scope limit (flagged for product review, not an oversight).

use crate::config::AutomationConfig;
use crate::diagnostics::DiagnosticsRecorder;
use crate::element::WebElement;
use crate::engine::BrowserEngine;
use crate::errors::AutomationError;
use crate::locator::{Locator, Resolution};
use crate::roles;
use crate::selector::RoleSpec;
use crate::storage::{AuditSink, StepAuditEntry};
use crate::wait::settle;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// Stable audit step names. These are part of the audit contract; renaming one
// breaks downstream diagnosis queries.
pub const STEP_INITIATION: &str = "initiation_clicked";
pub const STEP_INITIAL_NOT_FOUND: &str = "initial_control_not_found";
pub const STEP_ENTRY_CONFIRM: &str = "entry_confirm_clicked";
pub const STEP_ADVANCE: &str = "advance_clicked";
pub const STEP_NEXT_NOT_FOUND: &str = "next_not_found";
pub const STEP_DOCUMENT: &str = "document_step_processed";
pub const STEP_REVIEW: &str = "review_clicked";
pub const STEP_REVIEW_ABSENT: &str = "review_not_present";
pub const STEP_SUBMIT: &str = "submit_clicked";
pub const STEP_SUBMIT_FALLBACK: &str = "submitted_via_fallback";
pub const STEP_FALLBACK_IMPOSSIBLE: &str = "fallback_not_possible";
pub const STEP_SUBMIT_NOT_FOUND: &str = "submit_not_found_or_required_questions";
pub const STEP_FAILURE: &str = "step_failure";

/// Steps of the wizard, in conventional order. Optional steps may be skipped;
/// the terminals are `Done` and `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Start,
    EntryConfirm,
    Advance1,
    DocumentSelect,
    Advance2,
    Review,
    Submit,
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    InitialControlNotFound,
    AdvanceControlNotFound,
    SubmitNotFoundOrRequiredQuestions,
    FallbackNotPossible,
    /// A control resolved but interacting with it failed (stale handle,
    /// driver hiccup). The record stays unsubmitted for a later cycle.
    StepFailure(String),
}

/// Terminal result of one wizard session. Only `Done` authorizes the caller
/// to mark the record submitted; `Aborted` never mutates submitted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    Done { via_fallback: bool },
    Aborted { reason: AbortReason },
}

impl WizardOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, WizardOutcome::Done { .. })
    }
}

/// Ephemeral per-record session state: the current step and the outcomes
/// accumulated so far. Discarded once the record reaches a terminal.
struct WizardSession {
    target_url: String,
    current: WizardStep,
    outcomes: Vec<(String, bool)>,
}

impl WizardSession {
    fn new(target_url: &str) -> Self {
        Self {
            target_url: target_url.to_string(),
            current: WizardStep::Start,
            outcomes: Vec::new(),
        }
    }

    fn transition(&mut self, next: WizardStep) {
        debug!(from = ?self.current, to = ?next, "wizard transition");
        self.current = next;
    }
}

/// Executes the submission wizard for one record at a time. Reads global
/// modal state, so sessions are strictly sequential per browser session.
pub struct WizardEngine {
    engine: Arc<dyn BrowserEngine>,
    audit: Arc<dyn AuditSink>,
    diagnostics: DiagnosticsRecorder,
    config: AutomationConfig,
}

impl WizardEngine {
    pub fn new(
        engine: Arc<dyn BrowserEngine>,
        audit: Arc<dyn AuditSink>,
        diagnostics: DiagnosticsRecorder,
        config: AutomationConfig,
    ) -> Self {
        Self {
            engine,
            audit,
            diagnostics,
            config,
        }
    }

    /// Run the wizard for the listing currently open in the session.
    ///
    /// Every step attempt appends one audit row; each terminal is reached
    /// with at least one row for the record. Driver faults below the
    /// recoverable threshold abort this record only.
    #[instrument(level = "info", skip(self), fields(url = target_url))]
    pub async fn run(&self, target_url: &str) -> Result<WizardOutcome, AutomationError> {
        let mut session = WizardSession::new(target_url);

        // Start: the apply control is mandatory.
        let apply = Locator::new(self.engine.clone(), roles::apply_control())
            .poll_every(self.config.resolve_poll_interval);
        match apply.resolve(Some(self.config.wait_budget)).await? {
            Resolution::Found(control) => {
                if let Some(outcome) = self.click_or_abort(&mut session, &control).await {
                    return Ok(outcome);
                }
                self.audit_ok(&mut session, STEP_INITIATION, None).await;
                settle(self.config.settle_delay).await;
            }
            Resolution::Absent => {
                return Ok(self
                    .abort_with_diagnostics(
                        &mut session,
                        STEP_INITIAL_NOT_FOUND,
                        "apply control did not resolve",
                        AbortReason::InitialControlNotFound,
                    )
                    .await);
            }
        }

        // The modal root becomes the explicit scope of every later step.
        let modal = Locator::new(self.engine.clone(), roles::modal_root())
            .poll_every(self.config.resolve_poll_interval)
            .resolve(Some(self.config.wait_budget))
            .await?
            .into_option();
        if modal.is_none() {
            debug!("modal root not resolved, steps run against page scope");
        }

        session.transition(WizardStep::EntryConfirm);
        if let Resolution::Found(confirm) = self
            .scoped(roles::entry_confirm(), &modal)
            .resolve(None)
            .await?
        {
            // Optional step: absence is not audited as failure, presence is
            // clicked and audited like any other step.
            if let Some(outcome) = self.click_or_abort(&mut session, &confirm).await {
                return Ok(outcome);
            }
            self.audit_ok(&mut session, STEP_ENTRY_CONFIRM, None).await;
            settle(self.config.settle_delay).await;
        }

        session.transition(WizardStep::Advance1);
        match self.resolve_advance(&modal).await? {
            Some(advance) => {
                if let Some(outcome) = self.click_or_abort(&mut session, &advance).await {
                    return Ok(outcome);
                }
                self.audit_ok(&mut session, STEP_ADVANCE, Some("first advance"))
                    .await;
                settle(self.config.settle_delay).await;
            }
            None => return Ok(self.fallback_finalize(&mut session, &modal).await?),
        }

        session.transition(WizardStep::DocumentSelect);
        if let Some(outcome) = self.document_select(&mut session, &modal).await? {
            return Ok(outcome);
        }

        session.transition(WizardStep::Advance2);
        match self.resolve_advance(&modal).await? {
            Some(advance) => {
                if let Some(outcome) = self.click_or_abort(&mut session, &advance).await {
                    return Ok(outcome);
                }
                self.audit_ok(&mut session, STEP_ADVANCE, Some("second advance"))
                    .await;
                settle(self.config.settle_delay).await;
            }
            None => {
                // Mandatory here: an unresolved second advance almost always
                // means required questions exist downstream.
                return Ok(self
                    .abort_with_diagnostics(
                        &mut session,
                        STEP_NEXT_NOT_FOUND,
                        "second advance control did not resolve",
                        AbortReason::AdvanceControlNotFound,
                    )
                    .await);
            }
        }

        session.transition(WizardStep::Review);
        match self
            .scoped(roles::review_control(), &modal)
            .resolve(None)
            .await?
        {
            Resolution::Found(review) => {
                if let Some(outcome) = self.click_or_abort(&mut session, &review).await {
                    return Ok(outcome);
                }
                self.audit_ok(&mut session, STEP_REVIEW, None).await;
                settle(self.config.settle_delay).await;
            }
            Resolution::Absent => {
                // Expected for short flows; a successful outcome, not a defect.
                self.audit_ok(&mut session, STEP_REVIEW_ABSENT, None).await;
            }
        }

        session.transition(WizardStep::Submit);
        match self.resolve_submit(&modal).await? {
            Some(submit) => {
                if let Some(outcome) = self.click_or_abort(&mut session, &submit).await {
                    return Ok(outcome);
                }
                self.audit_ok(&mut session, STEP_SUBMIT, None).await;
                session.transition(WizardStep::Done);
                info!(steps = session.outcomes.len(), "wizard completed via main path");
                Ok(WizardOutcome::Done {
                    via_fallback: false,
                })
            }
            None => Ok(self
                .abort_with_diagnostics(
                    &mut session,
                    STEP_SUBMIT_NOT_FOUND,
                    "submit control did not resolve; flow likely has required questions",
                    AbortReason::SubmitNotFoundOrRequiredQuestions,
                )
                .await),
        }
    }

    /// Alternate completion path when the first advance cannot be resolved:
    /// try review then submit directly. Audited distinctly from the main path.
    async fn fallback_finalize(
        &self,
        session: &mut WizardSession,
        modal: &Option<WebElement>,
    ) -> Result<WizardOutcome, AutomationError> {
        debug!("first advance unresolved, attempting fallback finalize");

        if let Resolution::Found(review) = self
            .scoped(roles::review_control(), modal)
            .resolve(None)
            .await?
        {
            if let Some(outcome) = self.click_or_abort(session, &review).await {
                return Ok(outcome);
            }
            self.audit_ok(session, STEP_REVIEW, Some("fallback path")).await;
            settle(self.config.settle_delay).await;
        }

        match self.resolve_submit(modal).await? {
            Some(submit) => {
                if let Some(outcome) = self.click_or_abort(session, &submit).await {
                    return Ok(outcome);
                }
                self.audit_ok(session, STEP_SUBMIT_FALLBACK, None).await;
                session.transition(WizardStep::Done);
                info!(steps = session.outcomes.len(), "wizard completed via fallback path");
                Ok(WizardOutcome::Done { via_fallback: true })
            }
            None => Ok(self
                .abort_with_diagnostics(
                    session,
                    STEP_FALLBACK_IMPOSSIBLE,
                    "neither advance nor submit control resolved",
                    AbortReason::FallbackNotPossible,
                )
                .await),
        }
    }

    /// Optional document step. An already-active selection skips interaction;
    /// no candidates at all just means the step does not apply to this record.
    /// Audited as processed either way.
    async fn document_select(
        &self,
        session: &mut WizardSession,
        modal: &Option<WebElement>,
    ) -> Result<Option<WizardOutcome>, AutomationError> {
        if self
            .scoped(roles::document_selected(), modal)
            .resolve(None)
            .await?
            .is_found()
        {
            self.audit_ok(session, STEP_DOCUMENT, Some("selection already active"))
                .await;
            return Ok(None);
        }

        match self
            .scoped(roles::document_option(), modal)
            .resolve(None)
            .await?
        {
            Resolution::Found(option) => {
                if let Some(outcome) = self.click_or_abort(session, &option).await {
                    return Ok(Some(outcome));
                }
                self.audit_ok(session, STEP_DOCUMENT, Some("selected first option"))
                    .await;
                settle(self.config.settle_delay).await;
            }
            Resolution::Absent => {
                self.audit_ok(session, STEP_DOCUMENT, Some("no document step"))
                    .await;
            }
        }
        Ok(None)
    }

    /// Layered advance resolution: the exact-attribute chain polled over short
    /// bounded intervals (the control can render asynchronously), then the
    /// semantic vocabulary chain scoped to the modal root.
    async fn resolve_advance(
        &self,
        modal: &Option<WebElement>,
    ) -> Result<Option<WebElement>, AutomationError> {
        let exact = self
            .scoped(roles::advance_exact(), modal)
            .resolve(Some(self.config.advance_attribute_budget()))
            .await?;
        if let Resolution::Found(element) = exact {
            return Ok(Some(element));
        }
        Ok(self
            .scoped(roles::advance_semantic(), modal)
            .resolve(None)
            .await?
            .into_option())
    }

    /// Same layering for the final submission control.
    async fn resolve_submit(
        &self,
        modal: &Option<WebElement>,
    ) -> Result<Option<WebElement>, AutomationError> {
        let exact = self
            .scoped(roles::submit_exact(), modal)
            .resolve(None)
            .await?;
        if let Resolution::Found(element) = exact {
            return Ok(Some(element));
        }
        Ok(self
            .scoped(roles::submit_semantic(), modal)
            .resolve(None)
            .await?
            .into_option())
    }

    fn scoped(&self, spec: RoleSpec, modal: &Option<WebElement>) -> Locator {
        let locator = Locator::new(self.engine.clone(), spec)
            .poll_every(self.config.resolve_poll_interval);
        match modal {
            Some(root) => locator.within(root.clone()),
            None => locator,
        }
    }

    /// Click a resolved control; a recoverable failure aborts this record
    /// with diagnostics, a driver-level fault propagates to the caller.
    async fn click_or_abort(
        &self,
        session: &mut WizardSession,
        control: &WebElement,
    ) -> Option<WizardOutcome> {
        match control.click().await {
            Ok(()) => None,
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "control click failed, aborting record");
                let snapshot = control.snapshot().await;
                let detail = match serde_json::to_string(&snapshot) {
                    Ok(json) => format!("click failed: {e}; control: {json}"),
                    Err(_) => format!("click failed: {e}"),
                };
                Some(
                    self.abort_with_diagnostics(
                        session,
                        STEP_FAILURE,
                        detail,
                        AbortReason::StepFailure(e.to_string()),
                    )
                    .await,
                )
            }
            Err(e) => {
                // Driver-level fault on a click still only costs this record;
                // a truly unusable session surfaces on the next query instead.
                self.append(StepAuditEntry::failed(
                    &session.target_url,
                    STEP_FAILURE,
                    format!("driver fault: {e}"),
                ))
                .await;
                session.transition(WizardStep::Aborted);
                Some(WizardOutcome::Aborted {
                    reason: AbortReason::StepFailure(e.to_string()),
                })
            }
        }
    }

    async fn abort_with_diagnostics(
        &self,
        session: &mut WizardSession,
        step_name: &str,
        detail: impl Into<String>,
        reason: AbortReason,
    ) -> WizardOutcome {
        let detail = detail.into();
        let snapshots = self
            .diagnostics
            .capture(&session.target_url, step_name)
            .await;
        session.outcomes.push((step_name.to_string(), false));
        self.append(
            StepAuditEntry::failed(&session.target_url, step_name, detail)
                .with_snapshots(snapshots),
        )
        .await;
        session.transition(WizardStep::Aborted);
        info!(?reason, "wizard aborted");
        WizardOutcome::Aborted { reason }
    }

    async fn audit_ok(&self, session: &mut WizardSession, step_name: &str, detail: Option<&str>) {
        session.outcomes.push((step_name.to_string(), true));
        let mut entry = StepAuditEntry::ok(&session.target_url, step_name);
        if let Some(detail) = detail {
            entry = entry.with_detail(detail);
        }
        self.append(entry).await;
    }

    /// Best-effort append: a broken sink is logged, never propagated.
    async fn append(&self, entry: StepAuditEntry) {
        if let Err(e) = self.audit.append_step(entry).await {
            warn!(error = %e, "audit sink append failed");
        }
    }
}
