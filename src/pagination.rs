use crate::config::AutomationConfig;
use crate::element::WebElement;
use crate::engine::BrowserEngine;
use crate::errors::AutomationError;
use crate::listing::{ListingExtractor, ListingRecord};
use crate::roles;
use crate::wait::{poll_until, settle};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What a completed walk covered.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages: usize,
    pub records: usize,
    /// True when the walk stopped because the next page control never became
    /// interactable, rather than because no further page exists.
    pub terminated_early: bool,
}

/// Drives the listing extractor across every results page.
///
/// Termination is bounded by DOM state: the walker tracks the active page
/// indicator and stops when there is no successor, when the indicator set
/// disappears, or when a page label comes around twice. It never revisits a
/// page and invokes the extractor at most once per indicator control.
pub struct PaginationWalker {
    engine: Arc<dyn BrowserEngine>,
    extractor: ListingExtractor,
    config: AutomationConfig,
}

impl PaginationWalker {
    pub fn new(engine: Arc<dyn BrowserEngine>, config: AutomationConfig) -> Self {
        let extractor = ListingExtractor::new(engine.clone(), config.clone());
        Self {
            engine,
            extractor,
            config,
        }
    }

    /// Extract the current page, then advance page by page, delivering each
    /// batch through `on_page` as soon as it is extracted. Pages already
    /// delivered stay delivered regardless of how the walk ends.
    #[instrument(level = "info", skip_all)]
    pub async fn walk_all<F, Fut>(&self, mut on_page: F) -> Result<WalkSummary, AutomationError>
    where
        F: FnMut(Vec<ListingRecord>) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut summary = WalkSummary::default();
        let mut visited: HashSet<String> = HashSet::new();

        let cards = self.extractor.current_cards().await?;
        let batch = self.extractor.extract(&cards).await;
        summary.pages = 1;
        summary.records += batch.len();
        on_page(batch).await;

        loop {
            let indicators = self
                .engine
                .find_elements(&roles::page_indicator_strategy(), None)
                .await?;
            if indicators.is_empty() {
                debug!("no page indicators, single-page result");
                break;
            }

            let Some(current_idx) = self.current_indicator(&indicators).await else {
                debug!("no indicator flagged current, treating as single page");
                break;
            };

            let label = self.indicator_label(&indicators[current_idx]).await;
            if !visited.insert(label.clone()) {
                warn!(page = %label, "page indicator seen twice, stopping walk");
                break;
            }

            let Some(next) = indicators.get(current_idx + 1) else {
                info!(pages = summary.pages, "no further page, walk complete");
                break;
            };

            if !self.await_interactable(next).await {
                warn!(
                    wait = ?self.config.page_control_wait,
                    "next page control never became interactable, ending walk"
                );
                summary.terminated_early = true;
                break;
            }

            next.click().await?;
            settle(self.config.settle_delay).await;

            let cards = self.extractor.current_cards().await?;
            let batch = self.extractor.extract(&cards).await;
            summary.pages += 1;
            summary.records += batch.len();
            on_page(batch).await;
        }

        info!(
            pages = summary.pages,
            records = summary.records,
            early = summary.terminated_early,
            "pagination walk finished"
        );
        Ok(summary)
    }

    /// Index of the control carrying the aria-current equivalent attribute.
    async fn current_indicator(&self, indicators: &[WebElement]) -> Option<usize> {
        for (idx, control) in indicators.iter().enumerate() {
            match control.attribute(roles::CURRENT_PAGE_ATTR).await {
                Ok(Some(value)) if !value.is_empty() && value != "false" => return Some(idx),
                Ok(_) => {}
                Err(e) => debug!(idx, error = %e, "indicator attribute read failed"),
            }
        }
        None
    }

    async fn indicator_label(&self, control: &WebElement) -> String {
        control
            .text()
            .await
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|_| control.id())
    }

    /// Bounded wait for the control to become visible and enabled.
    async fn await_interactable(&self, control: &WebElement) -> bool {
        poll_until(
            self.config.page_control_wait,
            self.config.page_control_poll_interval,
            || async {
                let visible = control.is_visible().await.unwrap_or(false);
                let enabled = control.is_enabled().await.unwrap_or(false);
                (visible && enabled).then_some(())
            },
        )
        .await
        .is_some()
    }
}
