use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::protocol::{PREFS_COOKIE, PREFS_TTL_DAYS};
use thiserror::Error;
use url::Url;

pub const CONFIG_FILE: &str = "page_ui.toml";
/// Upper bound for `cache_ttl_days`, ten years.
pub const MAX_CACHE_TTL_DAYS: i64 = 3_650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid theme endpoint '{raw}': {source}")]
    Endpoint {
        raw: String,
        source: url::ParseError,
    },
    #[error("cache_ttl_days must be within 1..=3650, got {0}")]
    CacheTtl(i64),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme_endpoint: String,
    pub session_cookie: Option<String>,
    pub request_timeout_ms: u64,
    pub command_queue_capacity: usize,
    pub theme_control_selector: String,
    pub cache_key: String,
    pub cache_ttl_days: i64,
    pub notice_fade_after_ms: u64,
    pub notice_remove_after_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme_endpoint: "http://127.0.0.1:8080/nastavenia/vzhlad".into(),
            session_cookie: None,
            request_timeout_ms: 10_000,
            command_queue_capacity: 64,
            theme_control_selector: r#"[name="theme"]"#.into(),
            cache_key: PREFS_COOKIE.into(),
            cache_ttl_days: PREFS_TTL_DAYS,
            notice_fade_after_ms: 3_000,
            notice_remove_after_ms: 500,
        }
    }
}

impl UiConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CACHE_TTL_DAYS).contains(&self.cache_ttl_days) {
            return Err(ConfigError::CacheTtl(self.cache_ttl_days));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.theme_endpoint).map_err(|source| ConfigError::Endpoint {
            raw: self.theme_endpoint.clone(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn notice_fade_after(&self) -> Duration {
        Duration::from_millis(self.notice_fade_after_ms)
    }

    pub fn notice_remove_after(&self) -> Duration {
        Duration::from_millis(self.notice_remove_after_ms)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.cache_ttl_days.clamp(1, MAX_CACHE_TTL_DAYS))
    }

    /// `APP__*` environment overrides, applied on top of file values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("APP__THEME_ENDPOINT") {
            self.theme_endpoint = v;
        }
        if let Some(v) = lookup("APP__SESSION_COOKIE") {
            self.session_cookie = Some(v);
        }
        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_MS") {
            if let Ok(parsed) = v.parse() {
                self.request_timeout_ms = parsed;
            }
        }
        if let Some(v) = lookup("APP__NOTICE_FADE_AFTER_MS") {
            if let Ok(parsed) = v.parse() {
                self.notice_fade_after_ms = parsed;
            }
        }
        if let Some(v) = lookup("APP__NOTICE_REMOVE_AFTER_MS") {
            if let Ok(parsed) = v.parse() {
                self.notice_remove_after_ms = parsed;
            }
        }
    }
}

/// Defaults, then `page_ui.toml` in the working directory when it parses,
/// then environment overrides.
pub fn load_ui_config() -> UiConfig {
    let mut config = match UiConfig::from_file(Path::new(CONFIG_FILE)) {
        Ok(config) => config,
        Err(ConfigError::Read { .. }) => UiConfig::default(),
        Err(err) => {
            tracing::warn!("ignoring {CONFIG_FILE}: {err}");
            UiConfig::default()
        }
    };
    config.apply_env(|key| std::env::var(key).ok());
    config
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
