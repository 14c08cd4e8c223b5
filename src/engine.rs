use crate::element::WebElement;
use crate::errors::AutomationError;
use crate::selector::Strategy;

/// The browser-control capability the core consumes.
///
/// Implementations wrap a concrete driver (WebDriver, CDP, a scripted fixture
/// in tests). Queries are single-shot and non-waiting: all polling and
/// fallback ordering lives in [`crate::locator::Locator`], so bounded waiting
/// exists in exactly one place.
///
/// Engine faults are the only session-fatal error class; everything above this
/// trait contains failures at card/step/record granularity.
#[async_trait::async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Navigate the session to a URL and wait for the document to load.
    async fn navigate(&self, url: &str) -> Result<(), AutomationError>;

    /// Evaluate one strategy against the current page, optionally scoped to a
    /// root element. Returns every match in document order, visible or not;
    /// the resolver applies visibility and interactability filtering.
    async fn find_elements(
        &self,
        strategy: &Strategy,
        scope: Option<&WebElement>,
    ) -> Result<Vec<WebElement>, AutomationError>;

    /// Serialized markup of the current page, for diagnostics snapshots.
    async fn page_source(&self) -> Result<String, AutomationError>;

    /// Encoded image bytes of the current viewport, for diagnostics snapshots.
    async fn screenshot(&self) -> Result<Vec<u8>, AutomationError>;

    /// Execute a script in page context.
    async fn execute_script(&self, js: &str) -> Result<serde_json::Value, AutomationError>;
}
