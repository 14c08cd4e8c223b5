use std::time::Duration;

/// Represents ways to locate an element on the page.
///
/// Strategies are deliberately few: each one corresponds to a markup variant
/// the engine has actually been observed to need, not a general query language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Select by CSS selector, evaluated by the driver.
    Css(String),
    /// Select by visible text content (trimmed, case-insensitive containment).
    Text(String),
    /// Select by aria-label (case-insensitive containment).
    AriaLabel(String),
    /// Select by exact attribute value. An empty value matches any element
    /// that carries the attribute at all (valueless marker attributes).
    Attribute { name: String, value: String },
    /// Represents an invalid selector string, with a reason.
    Invalid(String),
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<&str> for Strategy {
    fn from(s: &str) -> Self {
        match s {
            _ if s.starts_with("css:") => Strategy::Css(s[4..].trim().to_string()),
            _ if s.starts_with("text:") => Strategy::Text(s[5..].trim().to_string()),
            _ if s.starts_with("aria:") => Strategy::AriaLabel(s[5..].trim().to_string()),
            _ if s.starts_with("attr:") => {
                let body = &s[5..];
                match body.split_once('=') {
                    Some((name, value)) if !name.trim().is_empty() => Strategy::Attribute {
                        name: name.trim().to_string(),
                        value: value.trim().to_string(),
                    },
                    _ => Strategy::Invalid(format!(
                        "attribute selector must be 'attr:name=value', got \"{s}\""
                    )),
                }
            }
            // Bare #id / .class shorthands read naturally as CSS.
            _ if s.starts_with('#') || s.starts_with('.') => Strategy::Css(s.to_string()),
            _ => Strategy::Invalid(format!(
                "Unknown selector format: \"{s}\". Use prefixes 'css:', 'text:', 'aria:' or 'attr:name=value'."
            )),
        }
    }
}

/// One entry in a role's fallback chain: a strategy plus its own optional wait
/// budget. A `None` wait defers to the budget the caller passes at resolve time.
#[derive(Debug, Clone)]
pub struct StrategyAttempt {
    pub strategy: Strategy,
    pub wait: Option<Duration>,
}

impl StrategyAttempt {
    pub fn new(strategy: impl Into<Strategy>) -> Self {
        Self {
            strategy: strategy.into(),
            wait: None,
        }
    }

    pub fn with_wait(strategy: impl Into<Strategy>, wait: Duration) -> Self {
        Self {
            strategy: strategy.into(),
            wait: Some(wait),
        }
    }
}

impl From<&str> for StrategyAttempt {
    fn from(s: &str) -> Self {
        StrategyAttempt::new(Strategy::from(s))
    }
}

/// A named interaction point ("title field", "next-step control") with an
/// ordered list of fallback strategies. Strategies are tried strictly in
/// order; the first that yields a visible, interactable match wins.
#[derive(Debug, Clone)]
pub struct RoleSpec {
    pub role: String,
    pub attempts: Vec<StrategyAttempt>,
}

impl RoleSpec {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            attempts: Vec::new(),
        }
    }

    pub fn strategy(mut self, strategy: impl Into<Strategy>) -> Self {
        self.attempts.push(StrategyAttempt::new(strategy));
        self
    }

    pub fn strategy_with_wait(mut self, strategy: impl Into<Strategy>, wait: Duration) -> Self {
        self.attempts.push(StrategyAttempt::with_wait(strategy, wait));
        self
    }

    /// Any `Invalid` entry poisons the whole spec; surfaced before resolution
    /// so a typo in a fallback chain fails loudly instead of silently
    /// shortening the chain.
    pub fn validate(&self) -> Result<(), crate::AutomationError> {
        for attempt in &self.attempts {
            if let Strategy::Invalid(reason) = &attempt.strategy {
                return Err(crate::AutomationError::InvalidSelector(format!(
                    "role '{}': {reason}",
                    self.role
                )));
            }
        }
        Ok(())
    }
}
