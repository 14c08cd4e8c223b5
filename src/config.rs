use std::path::PathBuf;
use std::time::Duration;

/// Locator polling cadence used when no config is in scope, and the default
/// for [`AutomationConfig::resolve_poll_interval`].
pub const DEFAULT_RESOLVE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Timing and marker configuration shared across the flows.
#[derive(Debug, Clone)]
pub struct AutomationConfig {
    /// Default wait budget for locator roles that poll.
    pub wait_budget: Duration,
    /// Polling cadence while a locator wait budget runs down.
    pub resolve_poll_interval: Duration,
    /// Fixed settle delay after clicks that trigger a re-render.
    pub settle_delay: Duration,
    /// How long the pagination walker waits for the next page control to
    /// become interactable before ending the walk.
    pub page_control_wait: Duration,
    /// Polling cadence during that wait.
    pub page_control_poll_interval: Duration,
    /// Number of short polls for the exact-attribute advance control, which
    /// can render asynchronously after the previous step.
    pub advance_poll_attempts: u32,
    /// Interval between those polls.
    pub advance_poll_interval: Duration,
    /// Marker text identifying listings that support the simplified flow.
    pub eligibility_marker: String,
    /// Where diagnostics snapshots are written.
    pub diagnostics_dir: PathBuf,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            wait_budget: Duration::from_secs(10),
            resolve_poll_interval: DEFAULT_RESOLVE_POLL_INTERVAL,
            settle_delay: Duration::from_millis(1500),
            page_control_wait: Duration::from_secs(15),
            page_control_poll_interval: Duration::from_millis(500),
            advance_poll_attempts: 10,
            advance_poll_interval: Duration::from_millis(500),
            eligibility_marker: "Easy apply".to_string(),
            diagnostics_dir: PathBuf::from("diagnostics"),
        }
    }
}

impl AutomationConfig {
    /// Total budget the layered advance resolution spends on the
    /// exact-attribute pass.
    pub fn advance_attribute_budget(&self) -> Duration {
        self.advance_poll_interval * self.advance_poll_attempts
    }
}
