use std::collections::HashMap;

use chrono::Duration;
use shared::domain::Theme;
use tokio::sync::RwLock;

use crate::config::Settings;

/// Persisted theme per session.
#[derive(Debug, Default)]
pub(crate) struct ThemeBook {
    themes: RwLock<HashMap<String, Theme>>,
}

impl ThemeBook {
    pub(crate) async fn get(&self, session: &str) -> Theme {
        self.themes
            .read()
            .await
            .get(session)
            .copied()
            .unwrap_or_default()
    }

    pub(crate) async fn set(&self, session: &str, theme: Theme) {
        self.themes.write().await.insert(session.to_string(), theme);
    }
}

pub(crate) struct AppState {
    pub(crate) themes: ThemeBook,
    pub(crate) redirect_target: String,
    pub(crate) prefs_ttl: Duration,
}

impl AppState {
    pub(crate) fn new(settings: &Settings) -> Self {
        Self {
            themes: ThemeBook::default(),
            redirect_target: settings.redirect_target.clone(),
            prefs_ttl: Duration::days(settings.prefs_ttl_days.max(1)),
        }
    }
}
