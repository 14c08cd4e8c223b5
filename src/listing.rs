use crate::config::AutomationConfig;
use crate::element::WebElement;
use crate::engine::BrowserEngine;
use crate::errors::AutomationError;
use crate::locator::{Locator, Resolution};
use crate::roles;
use crate::selector::RoleSpec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A listing extracted from one result card. `target_url` is the natural key;
/// the record is immutable once extracted and deduplicated downstream by the
/// repository's unique-key upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub title: String,
    pub organization: String,
    pub location: String,
    pub target_url: String,
}

/// Walks a collection of result cards, keeps the eligible ones and extracts a
/// fixed tuple of fields per card via role fallback chains.
pub struct ListingExtractor {
    engine: Arc<dyn BrowserEngine>,
    config: AutomationConfig,
}

impl ListingExtractor {
    pub fn new(engine: Arc<dyn BrowserEngine>, config: AutomationConfig) -> Self {
        Self { engine, config }
    }

    /// Enumerate the cards currently on the page.
    pub async fn current_cards(&self) -> Result<Vec<WebElement>, AutomationError> {
        let spec = roles::listing_cards();
        spec.validate()?;
        let mut cards = Vec::new();
        for attempt in &spec.attempts {
            cards = self.engine.find_elements(&attempt.strategy, None).await?;
            if !cards.is_empty() {
                break;
            }
        }
        Ok(cards)
    }

    /// Extract records from a card collection, in encounter order.
    ///
    /// Ineligible cards are skipped silently. A card whose structure throws a
    /// not-found or stale condition mid-read is skipped entirely and the batch
    /// continues; individual missing fields degrade to empty strings instead.
    #[instrument(level = "debug", skip_all, fields(cards = cards.len()))]
    pub async fn extract(&self, cards: &[WebElement]) -> Vec<ListingRecord> {
        let mut records = Vec::new();
        for (index, card) in cards.iter().enumerate() {
            match self.extract_card(card).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!(index, "card skipped"),
                Err(e) if e.is_recoverable() => {
                    warn!(index, error = %e, "card unreadable, skipping");
                }
                Err(e) => {
                    // Session-level faults still stop nothing here; the walker
                    // surfaces them when the next page query fails too.
                    warn!(index, error = %e, "card extraction failed");
                }
            }
        }
        debug!(extracted = records.len(), "batch extracted");
        records
    }

    async fn extract_card(
        &self,
        card: &WebElement,
    ) -> Result<Option<ListingRecord>, AutomationError> {
        if !self.is_eligible(card).await? {
            return Ok(None);
        }

        let title = self.field_text(card, roles::card_title()).await?;
        let organization = self.field_text(card, roles::card_organization()).await?;
        let location = self.field_text(card, roles::card_location()).await?;

        let link = Locator::new(self.engine.clone(), roles::card_link())
            .poll_every(self.config.resolve_poll_interval)
            .within(card.clone());
        let target_url = link.attribute("href", None).await?.unwrap_or_default();
        if target_url.is_empty() {
            // No natural key, nothing to upsert or process later.
            debug!("card has no target url, dropping");
            return Ok(None);
        }

        Ok(Some(ListingRecord {
            title,
            organization,
            location,
            target_url,
        }))
    }

    /// Badge match preferred; fallback is a case-insensitive full-text
    /// containment check over the card.
    async fn is_eligible(&self, card: &WebElement) -> Result<bool, AutomationError> {
        let badge = Locator::new(
            self.engine.clone(),
            roles::eligibility_badge(&self.config.eligibility_marker),
        )
        .poll_every(self.config.resolve_poll_interval)
        .within(card.clone());
        if let Resolution::Found(_) = badge.resolve(None).await? {
            return Ok(true);
        }
        let text = card.text().await?;
        Ok(text
            .to_lowercase()
            .contains(&self.config.eligibility_marker.to_lowercase()))
    }

    /// An absent field degrades to an empty string rather than aborting the
    /// card; a stale handle mid-read bubbles up so the card is skipped as a
    /// whole and the batch continues.
    async fn field_text(
        &self,
        card: &WebElement,
        spec: RoleSpec,
    ) -> Result<String, AutomationError> {
        let locator = Locator::new(self.engine.clone(), spec)
            .poll_every(self.config.resolve_poll_interval)
            .within(card.clone());
        match locator.resolve(None).await? {
            Resolution::Found(element) => Ok(element.text().await?.trim().to_string()),
            Resolution::Absent => Ok(String::new()),
        }
    }
}
