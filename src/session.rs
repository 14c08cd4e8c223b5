use crate::engine::BrowserEngine;
use crate::errors::AutomationError;
use crate::locator::Locator;
use crate::roles;
use crate::selector::RoleSpec;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Sign-in credentials. `Debug` deliberately not derived.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The main entry point: one logical browser session.
///
/// All operations are sequential from the caller's perspective; no two flows
/// share a session concurrently because the wizard reads global modal state.
pub struct Session {
    engine: Arc<dyn BrowserEngine>,
}

impl Session {
    pub fn new(engine: Arc<dyn BrowserEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> Arc<dyn BrowserEngine> {
        self.engine.clone()
    }

    #[instrument(skip(self))]
    pub async fn navigate(&self, url: &str) -> Result<(), AutomationError> {
        self.engine.navigate(url).await
    }

    pub fn locator(&self, spec: RoleSpec) -> Locator {
        Locator::new(self.engine.clone(), spec)
    }

    pub async fn page_source(&self) -> Result<String, AutomationError> {
        self.engine.page_source().await
    }

    pub async fn screenshot(&self) -> Result<Vec<u8>, AutomationError> {
        self.engine.screenshot().await
    }

    /// Fill the two sign-in fields and submit the form. Nothing more: any
    /// challenge or verification beyond this is out of scope.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<(), AutomationError> {
        let wait = Some(Duration::from_secs(10));

        let username = self
            .locator(roles::signin_username())
            .resolve_required(wait)
            .await?;
        username.type_text(&credentials.username).await?;

        let password = self
            .locator(roles::signin_password())
            .resolve_required(wait)
            .await?;
        password.type_text(&credentials.password).await?;

        let submit = self
            .locator(roles::signin_submit())
            .resolve_required(wait)
            .await?;
        submit.click().await?;

        info!("sign-in form submitted");
        Ok(())
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}
