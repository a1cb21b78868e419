use super::*;
use std::collections::HashMap;

#[test]
fn defaults_match_site_contract() {
    let config = UiConfig::default();
    assert_eq!(config.cache_key, "mz_prefs");
    assert_eq!(config.cache_ttl(), chrono::Duration::days(365));
    assert_eq!(config.notice_fade_after(), Duration::from_millis(3000));
    assert_eq!(
        config.endpoint_url().expect("url").path(),
        "/nastavenia/vzhlad"
    );
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let config = UiConfig::from_toml_str(
        r#"
        theme_endpoint = "https://kapely.example/nastavenia/vzhlad"
        notice_fade_after_ms = 1500
        "#,
    )
    .expect("parse");
    assert_eq!(config.notice_fade_after_ms, 1500);
    assert_eq!(config.notice_remove_after_ms, 500);
    assert_eq!(
        config.endpoint_url().expect("url").host_str(),
        Some("kapely.example")
    );
}

#[test]
fn env_overrides_win_and_bad_numbers_are_ignored() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("APP__THEME_ENDPOINT", "http://localhost:9000/nastavenia/vzhlad"),
        ("APP__REQUEST_TIMEOUT_MS", "not-a-number"),
        ("APP__SESSION_COOKIE", "session=xyz"),
    ]);
    let mut config = UiConfig::default();
    config.apply_env(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.theme_endpoint, "http://localhost:9000/nastavenia/vzhlad");
    assert_eq!(config.request_timeout_ms, 10_000);
    assert_eq!(config.session_cookie.as_deref(), Some("session=xyz"));
}

#[test]
fn invalid_endpoint_is_reported() {
    let config = UiConfig {
        theme_endpoint: "not a url".into(),
        ..UiConfig::default()
    };
    assert!(matches!(
        config.endpoint_url(),
        Err(ConfigError::Endpoint { .. })
    ));
    assert!(matches!(
        UiConfig::from_toml_str("request_timeout_ms = \"soon\""),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn cache_ttl_outside_bounds_is_rejected() {
    assert!(matches!(
        UiConfig::from_toml_str("cache_ttl_days = 0"),
        Err(ConfigError::CacheTtl(0))
    ));
    assert!(matches!(
        UiConfig::from_toml_str("cache_ttl_days = 1000000000"),
        Err(ConfigError::CacheTtl(1_000_000_000))
    ));
    assert_eq!(
        UiConfig::from_toml_str("cache_ttl_days = 30")
            .expect("parse")
            .cache_ttl(),
        chrono::Duration::days(30)
    );
}

#[test]
fn cache_ttl_accessor_clamps_hand_built_values() {
    let zero = UiConfig {
        cache_ttl_days: 0,
        ..UiConfig::default()
    };
    assert_eq!(zero.cache_ttl(), chrono::Duration::days(1));

    let huge = UiConfig {
        cache_ttl_days: i64::MAX,
        ..UiConfig::default()
    };
    assert_eq!(huge.cache_ttl(), chrono::Duration::days(MAX_CACHE_TTL_DAYS));
}
