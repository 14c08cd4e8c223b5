use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Debug;

/// Represents a live element handle on the page.
///
/// The concrete representation belongs to the browser driver behind
/// [`crate::engine::BrowserEngine`]; the core only ever talks to this
/// object-safe facade. A handle can go stale when the page re-renders, in
/// which case any operation returns [`AutomationError::StaleElement`].
pub struct WebElement {
    inner: Box<dyn ElementImpl>,
}

impl WebElement {
    pub fn new(inner: Box<dyn ElementImpl>) -> Self {
        Self { inner }
    }

    /// Driver-scoped element identifier, used for scoping sub-queries.
    pub fn id(&self) -> String {
        self.inner.id()
    }

    pub fn tag_name(&self) -> String {
        self.inner.tag_name()
    }

    pub async fn click(&self) -> Result<(), AutomationError> {
        self.inner.click().await
    }

    pub async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        self.inner.type_text(text).await
    }

    /// Full visible text of the element and its descendants.
    pub async fn text(&self) -> Result<String, AutomationError> {
        self.inner.text().await
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError> {
        self.inner.attribute(name).await
    }

    /// Non-zero layout presence and no hidden/display:none-equivalent state.
    pub async fn is_visible(&self) -> Result<bool, AutomationError> {
        self.inner.is_visible().await
    }

    /// Not disabled. Visibility is checked separately.
    pub async fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.inner.is_enabled().await
    }

    /// Read-only attribute dump for audit detail and logs.
    pub async fn snapshot(&self) -> ElementSnapshot {
        ElementSnapshot {
            id: self.id(),
            tag: self.tag_name(),
            text: self.inner.text().await.ok(),
            visible: self.inner.is_visible().await.unwrap_or(false),
            enabled: self.inner.is_enabled().await.unwrap_or(false),
        }
    }

    /// Downcast hook for driver implementations.
    pub fn as_any(&self) -> &dyn Any {
        self.inner.as_any()
    }
}

impl Clone for WebElement {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
        }
    }
}

impl Debug for WebElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebElement")
            .field("id", &self.inner.id())
            .field("tag", &self.inner.tag_name())
            .finish()
    }
}

/// The object-safe trait concrete drivers implement per element handle.
#[async_trait::async_trait]
pub trait ElementImpl: Send + Sync {
    fn id(&self) -> String;
    fn tag_name(&self) -> String;
    async fn click(&self) -> Result<(), AutomationError>;
    async fn type_text(&self, text: &str) -> Result<(), AutomationError>;
    async fn text(&self) -> Result<String, AutomationError>;
    async fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError>;
    async fn is_visible(&self) -> Result<bool, AutomationError>;
    async fn is_enabled(&self) -> Result<bool, AutomationError>;
    fn clone_boxed(&self) -> Box<dyn ElementImpl>;
    fn as_any(&self) -> &dyn Any;
}

/// Serializable, inert view of an element at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSnapshot {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub tag: String,
    #[serde(skip_serializing_if = "is_empty_string")]
    pub text: Option<String>,
    pub visible: bool,
    pub enabled: bool,
}

fn is_empty_string(opt: &Option<String>) -> bool {
    match opt {
        Some(s) => s.is_empty(),
        None => true,
    }
}
