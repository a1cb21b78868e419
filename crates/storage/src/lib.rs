//! Client-side key/value stores with expiry, plus the typed preference cache
//! layered on top of them.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use shared::{
    domain::Theme,
    protocol::{StoredPreferences, PREFS_COOKIE, PREFS_TTL_DAYS},
};
use thiserror::Error;
use tracing::debug;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid key '{0}'")]
    InvalidKey(String),
    #[error("ttl must be positive, got {0} seconds")]
    NonPositiveTtl(i64),
    #[error("ttl of {0} seconds overflows the expiry date")]
    TtlOverflow(i64),
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str);
}

fn validate(key: &str, ttl: Duration) -> Result<(), StoreError> {
    if key.is_empty()
        || key
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '=' | ';' | ','))
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    if ttl <= Duration::zero() {
        return Err(StoreError::NonPositiveTtl(ttl.num_seconds()));
    }
    Ok(())
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, StoreError> {
    now.checked_add_signed(ttl)
        .ok_or(StoreError::TtlOverflow(ttl.num_seconds()))
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

pub struct MemoryStore {
    entries: HashMap<String, Entry>,
    clock: Clock,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let now = (self.clock)();
        self.entries
            .get(key)
            .filter(|entry| entry.live_at(now))
            .map(|entry| entry.value.clone())
    }

    fn set(&mut self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        validate(key, ttl)?;
        let expires_at = expiry((self.clock)(), ttl)?;
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Site-wide cookie jar with `document.cookie` semantics: values are
/// percent-encoded on the wire, every cookie is `Path=/; SameSite=Lax`.
pub struct CookieJar {
    cookies: BTreeMap<String, Entry>,
    last_assignment: Option<String>,
    clock: Clock,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            cookies: BTreeMap::new(),
            last_assignment: None,
            clock,
        }
    }

    /// Seed from a `Cookie:` header. Pairs that fail to decode are dropped.
    pub fn from_header(header: &str, clock: Clock) -> Self {
        let mut jar = Self::with_clock(clock);
        for pair in header.split(';') {
            let Some((name, raw)) = pair.trim().split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            match urlencoding::decode(raw.trim()) {
                Ok(value) => {
                    jar.cookies.insert(
                        name.to_string(),
                        Entry {
                            value: value.into_owned(),
                            expires_at: None,
                        },
                    );
                }
                Err(err) => debug!(cookie = name, "skipping undecodable cookie: {err}"),
            }
        }
        jar
    }

    /// Live cookies rendered as a `Cookie:` header value.
    pub fn header(&self) -> String {
        let now = (self.clock)();
        self.cookies
            .iter()
            .filter(|(_, entry)| entry.live_at(now))
            .map(|(name, entry)| format!("{name}={}", urlencoding::encode(&entry.value)))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// The most recent `document.cookie = ...` assignment made by [`KeyValueStore::set`].
    pub fn last_assignment(&self) -> Option<&str> {
        self.last_assignment.as_deref()
    }
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for CookieJar {
    fn get(&self, key: &str) -> Option<String> {
        let now = (self.clock)();
        self.cookies
            .get(key)
            .filter(|entry| entry.live_at(now))
            .map(|entry| entry.value.clone())
    }

    fn set(&mut self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        validate(key, ttl)?;
        let expires_at = expiry((self.clock)(), ttl)?;
        self.last_assignment = Some(format!(
            "{key}={}; Path=/; SameSite=Lax; Expires={}",
            urlencoding::encode(value),
            expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
        ));
        self.cookies.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        if self.cookies.remove(key).is_some() {
            self.last_assignment = Some(format!(
                "{key}=; Path=/; SameSite=Lax; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
            ));
        }
    }
}

/// `Set-Cookie` value for a site-wide cookie living `max_age`.
pub fn set_cookie_header(name: &str, value: &str, max_age: Duration) -> String {
    format!(
        "{name}={}; Max-Age={}; Path=/; SameSite=Lax",
        urlencoding::encode(value),
        max_age.num_seconds()
    )
}

/// Typed view of the `mz_prefs` entry.
pub struct PreferenceCache<S: KeyValueStore> {
    store: S,
    key: String,
    ttl: Duration,
}

impl<S: KeyValueStore> PreferenceCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, PREFS_COOKIE, Duration::days(PREFS_TTL_DAYS))
    }

    pub fn with_key(store: S, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            ttl,
        }
    }

    pub fn load(&self) -> StoredPreferences {
        self.store
            .get(&self.key)
            .map(|raw| StoredPreferences::decode(&raw))
            .unwrap_or_default()
    }

    pub fn theme(&self) -> Option<Theme> {
        self.load().theme()
    }

    /// Supersedes the cached theme, keeping any other cached keys.
    pub fn store_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        let mut prefs = self.load();
        prefs.set_theme(theme);
        self.store.set(&self.key, &prefs.encode(), self.ttl)
    }

    pub fn raw(&self) -> Option<String> {
        self.store.get(&self.key)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
