use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Element is detached from the page: {0}")]
    StaleElement(String),

    #[error("Browser driver error: {0}")]
    DriverError(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AutomationError {
    /// True for faults that are contained at the card/step level and must not
    /// abort the surrounding batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AutomationError::ElementNotFound(_)
                | AutomationError::Timeout(_)
                | AutomationError::StaleElement(_)
        )
    }
}
