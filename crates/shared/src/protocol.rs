use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::Theme;

/// Cookie holding the serialized preference object.
pub const PREFS_COOKIE: &str = "mz_prefs";
/// Horizon of the cached preference entry.
pub const PREFS_TTL_DAYS: i64 = 365;
pub const THEME_ENDPOINT_PATH: &str = "/nastavenia/vzhlad";
pub const THEME_FIELD: &str = "theme";
pub const SESSION_COOKIE: &str = "session";

/// Body of the persistence POST (`application/x-www-form-urlencoded`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeForm {
    pub theme: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

/// The cached preference object. Keys other than `theme` are carried through
/// untouched so writers never drop preferences they do not understand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredPreferences {
    /// Lenient decode: anything that is not a JSON object becomes empty prefs.
    /// A `theme` that is not a string is dropped; every other key is kept.
    pub fn decode(raw: &str) -> Self {
        let Ok(Value::Object(mut extra)) = serde_json::from_str::<Value>(raw) else {
            return Self::default();
        };
        let theme = extra
            .remove("theme")
            .and_then(|value| value.as_str().map(str::to_string));
        Self { theme, extra }
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Cached theme, if present and within the enumerated set.
    pub fn theme(&self) -> Option<Theme> {
        self.theme.as_deref().and_then(|raw| raw.parse().ok())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = Some(theme.as_str().to_string());
    }
}
