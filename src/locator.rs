use crate::config::DEFAULT_RESOLVE_POLL_INTERVAL;
use crate::element::WebElement;
use crate::engine::BrowserEngine;
use crate::errors::AutomationError;
use crate::selector::{RoleSpec, Strategy};
use crate::wait::poll_until;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Outcome of resolving a locator role.
///
/// `Absent` is a normal branch, distinct from an error: the role simply has no
/// matching control on the current page. Callers decide whether the role was
/// mandatory.
#[derive(Debug)]
pub enum Resolution {
    Found(WebElement),
    Absent,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn into_option(self) -> Option<WebElement> {
        match self {
            Resolution::Found(el) => Some(el),
            Resolution::Absent => None,
        }
    }
}

/// A high-level API for resolving interaction roles against the live page.
///
/// A `Locator` binds a [`RoleSpec`] (an ordered fallback chain of strategies)
/// to the engine and an optional root scope. Strategies are tried strictly in
/// order; within a strategy, the first visible and interactable match wins.
#[derive(Clone)]
pub struct Locator {
    engine: Arc<dyn BrowserEngine>,
    spec: RoleSpec,
    root: Option<WebElement>,
    poll_interval: Duration,
}

impl Locator {
    pub fn new(engine: Arc<dyn BrowserEngine>, spec: RoleSpec) -> Self {
        Self {
            engine,
            spec,
            root: None,
            poll_interval: DEFAULT_RESOLVE_POLL_INTERVAL,
        }
    }

    /// Scope every query to descendants of `element`.
    pub fn within(mut self, element: WebElement) -> Self {
        self.root = Some(element);
        self
    }

    /// Polling cadence while a wait budget runs down, normally
    /// [`AutomationConfig::resolve_poll_interval`](crate::AutomationConfig).
    pub fn poll_every(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn role(&self) -> &str {
        &self.spec.role
    }

    /// Resolve the role. With a wait budget, each strategy polls within its
    /// own budget (or the call-level one); with no budget anywhere the check
    /// is immediate. Read-only: never scrolls or clicks.
    #[instrument(level = "debug", skip(self), fields(role = %self.spec.role))]
    pub async fn resolve(
        &self,
        wait_budget: Option<Duration>,
    ) -> Result<Resolution, AutomationError> {
        self.spec.validate()?;

        for attempt in &self.spec.attempts {
            let budget = attempt.wait.or(wait_budget);
            let found = match budget {
                Some(budget) => {
                    poll_until(budget, self.poll_interval, || {
                        self.first_interactable(&attempt.strategy)
                    })
                    .await
                }
                None => self.first_interactable(&attempt.strategy).await,
            };
            if let Some(element) = found {
                debug!(strategy = %attempt.strategy, "role resolved");
                return Ok(Resolution::Found(element));
            }
            debug!(strategy = %attempt.strategy, "strategy exhausted, trying next");
        }
        debug!("no strategy matched, role is absent");
        Ok(Resolution::Absent)
    }

    /// Resolve a mandatory role. `Absent` after an immediate check becomes
    /// `ElementNotFound`; `Absent` after a spent wait budget becomes `Timeout`.
    pub async fn resolve_required(
        &self,
        wait_budget: Option<Duration>,
    ) -> Result<WebElement, AutomationError> {
        match self.resolve(wait_budget).await? {
            Resolution::Found(element) => Ok(element),
            Resolution::Absent => Err(match wait_budget {
                Some(budget) => AutomationError::Timeout(format!(
                    "mandatory role '{}' did not resolve within {budget:?}",
                    self.spec.role
                )),
                None => AutomationError::ElementNotFound(format!(
                    "mandatory role '{}' did not resolve",
                    self.spec.role
                )),
            }),
        }
    }

    /// Attribute-read variant: resolve, then read one attribute off the match.
    /// `Absent` roles and missing attributes both yield `None`.
    pub async fn attribute(
        &self,
        name: &str,
        wait_budget: Option<Duration>,
    ) -> Result<Option<String>, AutomationError> {
        match self.resolve(wait_budget).await? {
            Resolution::Found(element) => element.attribute(name).await,
            Resolution::Absent => Ok(None),
        }
    }

    /// Single non-waiting pass for one strategy: first visible and enabled
    /// match, in document order. Query errors are treated as "nothing yet" so
    /// a transient driver hiccup mid-poll does not abort the whole chain.
    async fn first_interactable(&self, strategy: &Strategy) -> Option<WebElement> {
        let candidates = match self
            .engine
            .find_elements(strategy, self.root.as_ref())
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                debug!(strategy = %strategy, error = %e, "query failed during poll");
                return None;
            }
        };
        for candidate in candidates {
            let visible = candidate.is_visible().await.unwrap_or(false);
            let enabled = candidate.is_enabled().await.unwrap_or(false);
            if visible && enabled {
                return Some(candidate);
            }
        }
        None
    }
}
