//! Server-side persistence of the theme preference.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, redirect, Client, StatusCode};
use shared::{domain::Theme, protocol::ThemeForm};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server answered {0}")]
    Status(u16),
    #[error("persistence worker unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ThemePersistence: Send + Sync {
    async fn submit(&self, theme: Theme) -> Result<(), PersistError>;
}

/// Posts `theme=<value>` form-encoded to the preference endpoint.
///
/// Redirects are not followed: the endpoint answers with a redirect on
/// success, so 2xx and 3xx both count as persisted.
pub struct HttpThemePersistence {
    client: Client,
    endpoint: Url,
    session_cookie: Option<String>,
}

impl HttpThemePersistence {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, PersistError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|err| PersistError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            session_cookie: None,
        })
    }

    /// Sends `Cookie: <cookie>` with every submission.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

pub fn is_persisted_status(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}

#[async_trait]
impl ThemePersistence for HttpThemePersistence {
    async fn submit(&self, theme: Theme) -> Result<(), PersistError> {
        let mut request = self.client.post(self.endpoint.clone()).form(&ThemeForm {
            theme: theme.as_str().to_string(),
        });
        if let Some(cookie) = &self.session_cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|err| PersistError::Transport(err.to_string()))?;
        let status = response.status();
        debug!(%theme, status = status.as_u16(), "theme submission answered");
        if is_persisted_status(status) {
            Ok(())
        } else {
            Err(PersistError::Status(status.as_u16()))
        }
    }
}

/// User-facing text for a failed submission. The theme stays applied, so the
/// message only says it is not yet saved to the account.
pub fn describe_persist_failure(error: &PersistError) -> String {
    match error {
        PersistError::Status(401 | 403) => {
            "Theme applied on this device; sign in to save it to your account.".to_string()
        }
        PersistError::Status(code) if *code >= 500 => {
            "Theme applied on this device; the server could not save it right now.".to_string()
        }
        PersistError::Status(_) => {
            "Theme applied on this device; the server did not accept it.".to_string()
        }
        PersistError::Transport(_) | PersistError::Unavailable(_) => {
            "Theme applied on this device; it could not be saved (connection problem).".to_string()
        }
    }
}

#[cfg(test)]
#[path = "tests/persistence_tests.rs"]
mod tests;
