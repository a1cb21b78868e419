use super::*;

#[test]
fn defaults_without_file_or_env() {
    let settings = settings_from(None, |_| None);
    assert_eq!(settings.server_bind, "127.0.0.1:8080");
    assert_eq!(settings.redirect_target, "/nastavenia#vzhlad");
    assert_eq!(settings.prefs_ttl_days, 365);
}

#[test]
fn file_values_then_env_overrides() {
    let file = r#"
        bind_addr = "0.0.0.0:9000"
        redirect_target = "/profil"
        prefs_ttl_days = "30"
    "#;
    let settings = settings_from(Some(file), |key| match key {
        "APP__BIND_ADDR" => Some("127.0.0.1:9100".to_string()),
        "APP__PREFS_TTL_DAYS" => Some("soon".to_string()),
        _ => None,
    });
    assert_eq!(settings.server_bind, "127.0.0.1:9100");
    assert_eq!(settings.redirect_target, "/profil");
    assert_eq!(settings.prefs_ttl_days, 30);
}

#[test]
fn unparsable_file_is_ignored() {
    let settings = settings_from(Some("bind_addr = ["), |_| None);
    assert_eq!(settings.server_bind, Settings::default().server_bind);
}
