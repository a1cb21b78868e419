use std::{collections::HashMap, fs};

use serde::Deserialize;
use shared::protocol::PREFS_TTL_DAYS;

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    /// Where a successful theme POST redirects the browser.
    pub redirect_target: String,
    pub prefs_ttl_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            redirect_target: "/nastavenia#vzhlad".into(),
            prefs_ttl_days: PREFS_TTL_DAYS,
        }
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then flat `key = "value"` pairs from the settings file, then
/// environment overrides.
pub(crate) fn settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("bind_addr") {
                    settings.server_bind = v.clone();
                }
                if let Some(v) = file_cfg.get("redirect_target") {
                    settings.redirect_target = v.clone();
                }
                if let Some(parsed) = file_cfg.get("prefs_ttl_days").and_then(|v| v.parse().ok()) {
                    settings.prefs_ttl_days = parsed;
                }
            }
            Err(err) => tracing::warn!("ignoring {SETTINGS_FILE}: {err}"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__REDIRECT_TARGET") {
        settings.redirect_target = v;
    }
    if let Some(v) = env("APP__PREFS_TTL_DAYS") {
        if let Ok(parsed) = v.parse::<i64>() {
            settings.prefs_ttl_days = parsed;
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
