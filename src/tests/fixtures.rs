//! Scripted-DOM fixture engine. A fixture is a sequence of stages, each a
//! full node tree; clicking a node marked `advances()` swaps the active stage,
//! which is how re-renders (next page, next wizard step) are modeled. Element
//! handles refer to node ids: a handle whose id is missing from the active
//! stage is stale, exactly like a real re-rendered page.

use crate::element::{ElementImpl, WebElement};
use crate::engine::BrowserEngine;
use crate::errors::AutomationError;
use crate::listing::ListingRecord;
use crate::selector::Strategy;
use crate::storage::{AuditSink, ProcessingStatus, RecordRepository, StepAuditEntry};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

static NODE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// One node of a scripted page.
#[derive(Debug, Clone)]
pub struct FakeNode {
    pub id: String,
    pub tag: String,
    /// CSS selector strings this node answers to; the fixture matches them
    /// literally instead of parsing CSS.
    pub css_hooks: Vec<String>,
    /// The node's own text, not including descendants.
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub visible: bool,
    pub enabled: bool,
    pub advances_on_click: bool,
    pub children: Vec<FakeNode>,
}

impl FakeNode {
    pub fn new(tag: &str) -> Self {
        let n = NODE_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("node-{n}"),
            tag: tag.to_string(),
            css_hooks: Vec::new(),
            text: String::new(),
            attrs: HashMap::new(),
            visible: true,
            enabled: true,
            advances_on_click: false,
            children: Vec::new(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn hook(mut self, css: &str) -> Self {
        self.css_hooks.push(css.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Clicking this node swaps the fixture to the next stage.
    pub fn advances(mut self) -> Self {
        self.advances_on_click = true;
        self
    }

    pub fn child(mut self, child: FakeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: Vec<FakeNode>) -> Self {
        self.children.extend(children);
        self
    }

    fn subtree_text(&self) -> String {
        let mut parts = vec![self.text.clone()];
        for child in &self.children {
            parts.push(child.subtree_text());
        }
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }

    fn find_by_id(&self, id: &str) -> Option<&FakeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_id(id))
    }

    fn matches(&self, strategy: &Strategy) -> bool {
        match strategy {
            Strategy::Css(css) => self.css_hooks.iter().any(|h| h == css),
            Strategy::Text(text) => self
                .text
                .to_lowercase()
                .contains(&text.trim().to_lowercase()),
            Strategy::AriaLabel(label) => self
                .attrs
                .get("aria-label")
                .map(|v| v.to_lowercase().contains(&label.to_lowercase()))
                .unwrap_or(false),
            Strategy::Attribute { name, value } => match self.attrs.get(name) {
                Some(actual) => value.is_empty() || actual == value,
                None => false,
            },
            Strategy::Invalid(_) => false,
        }
    }

    /// Preorder collection of matching node ids, the fixture's document order.
    fn collect_matches(&self, strategy: &Strategy, out: &mut Vec<String>) {
        if self.matches(strategy) {
            out.push(self.id.clone());
        }
        for child in &self.children {
            child.collect_matches(strategy, out);
        }
    }
}

struct EngineState {
    stages: Vec<FakeNode>,
    current: usize,
    routes: HashMap<String, usize>,
    visited: Vec<String>,
    fail_navigation: bool,
    fail_page_source: bool,
    fail_screenshot: bool,
}

/// Scripted implementation of [`BrowserEngine`].
pub struct MockEngine {
    state: Arc<Mutex<EngineState>>,
}

impl MockEngine {
    pub fn new(stages: Vec<FakeNode>) -> Arc<Self> {
        assert!(!stages.is_empty(), "fixture needs at least one stage");
        Arc::new(Self {
            state: Arc::new(Mutex::new(EngineState {
                stages,
                current: 0,
                routes: HashMap::new(),
                visited: Vec::new(),
                fail_navigation: false,
                fail_page_source: false,
                fail_screenshot: false,
            })),
        })
    }

    /// Navigating to `url` switches the fixture to `stage`.
    pub fn route(self: &Arc<Self>, url: &str, stage: usize) -> Arc<Self> {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(url.to_string(), stage);
        self.clone()
    }

    /// Every navigation attempt fails with a driver error.
    pub fn fail_navigation(self: &Arc<Self>) -> Arc<Self> {
        self.state.lock().unwrap().fail_navigation = true;
        self.clone()
    }

    pub fn fail_snapshots(self: &Arc<Self>) -> Arc<Self> {
        let mut state = self.state.lock().unwrap();
        state.fail_page_source = true;
        state.fail_screenshot = true;
        self.clone()
    }

    pub fn current_stage(&self) -> usize {
        self.state.lock().unwrap().current
    }

    /// Rewind or jump the scripted page, for multi-cycle tests.
    pub fn set_stage(&self, stage: usize) {
        self.state.lock().unwrap().current = stage;
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    fn element(&self, node_id: &str, tag: &str) -> WebElement {
        WebElement::new(Box::new(FakeElement {
            state: self.state.clone(),
            node_id: node_id.to_string(),
            tag: tag.to_string(),
        }))
    }
}

#[async_trait::async_trait]
impl BrowserEngine for MockEngine {
    async fn navigate(&self, url: &str) -> Result<(), AutomationError> {
        let mut state = self.state.lock().unwrap();
        state.visited.push(url.to_string());
        if state.fail_navigation {
            return Err(AutomationError::DriverError(format!(
                "navigation to '{url}' refused"
            )));
        }
        if let Some(stage) = state.routes.get(url).copied() {
            state.current = stage;
        }
        Ok(())
    }

    async fn find_elements(
        &self,
        strategy: &Strategy,
        scope: Option<&WebElement>,
    ) -> Result<Vec<WebElement>, AutomationError> {
        let (ids, tags) = {
            let state = self.state.lock().unwrap();
            let root = &state.stages[state.current];
            let search_root = match scope {
                Some(el) => root.find_by_id(&el.id()).ok_or_else(|| {
                    AutomationError::StaleElement(format!("scope '{}' left the page", el.id()))
                })?,
                None => root,
            };
            let mut ids = Vec::new();
            search_root.collect_matches(strategy, &mut ids);
            let tags: Vec<String> = ids
                .iter()
                .map(|id| search_root.find_by_id(id).unwrap().tag.clone())
                .collect();
            (ids, tags)
        };

        Ok(ids
            .iter()
            .zip(tags.iter())
            .map(|(id, tag)| self.element(id, tag))
            .collect())
    }

    async fn page_source(&self) -> Result<String, AutomationError> {
        let state = self.state.lock().unwrap();
        if state.fail_page_source {
            return Err(AutomationError::DriverError("page source unavailable".into()));
        }
        Ok(format!("<html data-stage=\"{}\"></html>", state.current))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AutomationError> {
        let state = self.state.lock().unwrap();
        if state.fail_screenshot {
            return Err(AutomationError::DriverError("screenshot unavailable".into()));
        }
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn execute_script(&self, _js: &str) -> Result<serde_json::Value, AutomationError> {
        Ok(serde_json::Value::Null)
    }
}

/// Element handle into the scripted DOM.
struct FakeElement {
    state: Arc<Mutex<EngineState>>,
    node_id: String,
    tag: String,
}

impl FakeElement {
    fn with_node<T>(
        &self,
        f: impl FnOnce(&FakeNode) -> T,
    ) -> Result<T, AutomationError> {
        let state = self.state.lock().unwrap();
        let root = &state.stages[state.current];
        match root.find_by_id(&self.node_id) {
            Some(node) => Ok(f(node)),
            None => Err(AutomationError::StaleElement(format!(
                "element '{}' left the page",
                self.node_id
            ))),
        }
    }
}

#[async_trait::async_trait]
impl ElementImpl for FakeElement {
    fn id(&self) -> String {
        self.node_id.clone()
    }

    fn tag_name(&self) -> String {
        self.tag.clone()
    }

    async fn click(&self) -> Result<(), AutomationError> {
        let mut state = self.state.lock().unwrap();
        let current = state.current;
        let advances = state.stages[current]
            .find_by_id(&self.node_id)
            .ok_or_else(|| {
                AutomationError::StaleElement(format!("element '{}' left the page", self.node_id))
            })?
            .advances_on_click;
        if advances && current + 1 < state.stages.len() {
            state.current = current + 1;
        }
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        let text = text.to_string();
        let node_id = self.node_id.clone();
        let mut state = self.state.lock().unwrap();
        let current = state.current;
        // Record the typed value on the node for assertions.
        fn set_value(node: &mut FakeNode, id: &str, value: &str) -> bool {
            if node.id == id {
                node.attrs.insert("value".to_string(), value.to_string());
                return true;
            }
            node.children.iter_mut().any(|c| set_value(c, id, value))
        }
        if set_value(&mut state.stages[current], &node_id, &text) {
            Ok(())
        } else {
            Err(AutomationError::StaleElement(format!(
                "element '{node_id}' left the page"
            )))
        }
    }

    async fn text(&self) -> Result<String, AutomationError> {
        self.with_node(|node| node.subtree_text())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, AutomationError> {
        self.with_node(|node| node.attrs.get(name).cloned())
    }

    async fn is_visible(&self) -> Result<bool, AutomationError> {
        self.with_node(|node| node.visible)
    }

    async fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.with_node(|node| node.enabled)
    }

    fn clone_boxed(&self) -> Box<dyn ElementImpl> {
        Box::new(FakeElement {
            state: self.state.clone(),
            node_id: self.node_id.clone(),
            tag: self.tag.clone(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// In-memory [`RecordRepository`] preserving insertion order.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<RepoState>,
}

#[derive(Default)]
struct RepoState {
    order: Vec<String>,
    records: HashMap<String, (ListingRecord, ProcessingStatus)>,
}

impl MemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    pub fn status(&self, target_url: &str) -> Option<ProcessingStatus> {
        self.inner
            .lock()
            .unwrap()
            .records
            .get(target_url)
            .map(|(_, status)| status.clone())
    }
}

#[async_trait::async_trait]
impl RecordRepository for MemoryRepository {
    async fn upsert_listing(&self, record: &ListingRecord) -> Result<(), AutomationError> {
        let mut state = self.inner.lock().unwrap();
        if !state.records.contains_key(&record.target_url) {
            state.order.push(record.target_url.clone());
            state.records.insert(
                record.target_url.clone(),
                (
                    record.clone(),
                    ProcessingStatus {
                        eligible: true,
                        submitted: false,
                        submitted_at: None,
                    },
                ),
            );
        }
        // Conflict on the natural key is a no-op: re-scraping is idempotent.
        Ok(())
    }

    async fn eligible_unsubmitted(&self) -> Result<Vec<String>, AutomationError> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .order
            .iter()
            .filter(|url| {
                state
                    .records
                    .get(*url)
                    .map(|(_, s)| s.eligible && !s.submitted)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn mark_submitted(
        &self,
        target_url: &str,
        at: DateTime<Utc>,
    ) -> Result<(), AutomationError> {
        let mut state = self.inner.lock().unwrap();
        match state.records.get_mut(target_url) {
            Some((_, status)) if !status.submitted => {
                status.submitted = true;
                status.submitted_at = Some(at);
                Ok(())
            }
            // At-most-once: a second transition is a no-op, never a revert.
            Some(_) => Ok(()),
            None => Err(AutomationError::StorageError(format!(
                "unknown record '{target_url}'"
            ))),
        }
    }
}

/// In-memory append-only [`AuditSink`].
#[derive(Default)]
pub struct MemoryAudit {
    entries: Mutex<Vec<StepAuditEntry>>,
    fail: Mutex<bool>,
}

impl MemoryAudit {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let sink = Self::default();
        *sink.fail.lock().unwrap() = true;
        Arc::new(sink)
    }

    pub fn entries(&self) -> Vec<StepAuditEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn step_names(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.step_name.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl AuditSink for MemoryAudit {
    async fn append_step(&self, entry: StepAuditEntry) -> Result<(), AutomationError> {
        if *self.fail.lock().unwrap() {
            return Err(AutomationError::StorageError("audit sink offline".into()));
        }
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}
