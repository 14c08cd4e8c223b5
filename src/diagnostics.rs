use crate::engine::BrowserEngine;
use crate::storage::SnapshotRefs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Captures page-content and visual snapshots on failure.
///
/// Strictly best-effort: every capture failure is swallowed and logged, never
/// propagated, so diagnostics can never mask or replace the original
/// failure's audit entry.
#[derive(Clone)]
pub struct DiagnosticsRecorder {
    engine: Arc<dyn BrowserEngine>,
    dir: PathBuf,
}

impl DiagnosticsRecorder {
    pub fn new(engine: Arc<dyn BrowserEngine>, dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            dir: dir.into(),
        }
    }

    /// Capture whatever snapshots the session can still produce. Either ref
    /// may come back `None`.
    pub async fn capture(&self, record_key: &str, stage_label: &str) -> SnapshotRefs {
        let mut refs = SnapshotRefs::default();
        let stem = self.file_stem(record_key, stage_label);

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "cannot create diagnostics dir");
            return refs;
        }

        match self.engine.page_source().await {
            Ok(html) => {
                let path = self.dir.join(format!("{stem}.html"));
                match tokio::fs::write(&path, html).await {
                    Ok(()) => refs.html = Some(path),
                    Err(e) => warn!(error = %e, "failed to write page snapshot"),
                }
            }
            Err(e) => warn!(error = %e, "failed to read page source for diagnostics"),
        }

        match self.engine.screenshot().await {
            Ok(bytes) => {
                let path = self.dir.join(format!("{stem}.png"));
                match tokio::fs::write(&path, bytes).await {
                    Ok(()) => refs.screenshot = Some(path),
                    Err(e) => warn!(error = %e, "failed to write screenshot"),
                }
            }
            Err(e) => warn!(error = %e, "failed to capture screenshot for diagnostics"),
        }

        debug!(
            record = record_key,
            stage = stage_label,
            html = refs.html.is_some(),
            screenshot = refs.screenshot.is_some(),
            "diagnostics captured"
        );
        refs
    }

    fn file_stem(&self, record_key: &str, stage_label: &str) -> String {
        // Keys are URLs; keep only filesystem-safe characters.
        let safe: String = record_key
            .chars()
            .rev()
            .take(40)
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect::<String>()
            .chars()
            .rev()
            .collect();
        format!("{stage_label}-{safe}-{}", Uuid::new_v4().simple())
    }
}
