//! Resilient web-UI interaction engine for simplified application flows.
//!
//! The crate automates a dynamic, uncontrolled web application: it discovers
//! listing entries across paginated results, extracts structured fields with
//! tolerance for markup drift, and drives a multi-step application modal to
//! completion, auditing every step. Browser control, persistent storage and
//! the audit log are injected capability interfaces; the core owns only the
//! resolution, extraction and wizard logic.
//!
//! The interaction model is Playwright-inspired: a [`Session`] wraps a
//! [`BrowserEngine`], and every interaction point is a named role with an
//! ordered chain of fallback [`Strategy`]s resolved by a [`Locator`].

pub mod config;
pub mod diagnostics;
pub mod element;
pub mod engine;
pub mod errors;
pub mod listing;
pub mod locator;
pub mod pagination;
pub mod roles;
pub mod runner;
pub mod selector;
pub mod session;
pub mod storage;
#[cfg(test)]
mod tests;
pub mod wait;
pub mod wizard;

pub use config::AutomationConfig;
pub use element::{ElementImpl, ElementSnapshot, WebElement};
pub use engine::BrowserEngine;
pub use errors::AutomationError;
pub use listing::{ListingExtractor, ListingRecord};
pub use locator::{Locator, Resolution};
pub use pagination::{PaginationWalker, WalkSummary};
pub use runner::{CycleRunner, CycleSummary};
pub use selector::{RoleSpec, Strategy, StrategyAttempt};
pub use session::{Credentials, Session};
pub use storage::{AuditSink, ProcessingStatus, RecordRepository, SnapshotRefs, StepAuditEntry};
pub use wizard::{AbortReason, WizardEngine, WizardOutcome, WizardStep};
