//! Declarative panel table for the site. One row per panel replaces the
//! per-feature listener code the pages used to carry.

use crate::{panels::PanelOptions, triggers::PrefillScheme};

pub const FORMS_GROUP: &str = "forms";
pub const NAV_SELECTOR: &str = ".main-nav";
pub const NAV_TOGGLE_SELECTOR: &str = r#".hamburger, [data-toggle="main-nav"]"#;
/// Body attribute naming a panel to open at startup.
pub const AUTO_OPEN_ATTRIBUTE: &str = "data-zobraz";
/// Query parameter with the same meaning, set by server redirects.
pub const AUTO_OPEN_QUERY: &str = "zobraz_formular";

#[derive(Debug, Clone)]
pub struct PanelEntry {
    pub id: &'static str,
    pub options: PanelOptions,
    /// Selectors of elements that open this panel, besides `data-open`.
    pub triggers: Vec<&'static str>,
    /// Auto-open directive values resolving to this panel.
    pub aliases: Vec<&'static str>,
}

pub fn site_panels() -> Vec<PanelEntry> {
    vec![
        PanelEntry {
            id: "form-hladam-kapelu",
            options: PanelOptions::modal(FORMS_GROUP).close_control("#close-hladam-kapelu"),
            triggers: vec!["#show-dopyt-form"],
            aliases: vec!["dopyt"],
        },
        PanelEntry {
            id: "modal-login",
            options: PanelOptions::modal(FORMS_GROUP).close_control("#close-login"),
            triggers: vec!["#btn-login", ".open-login", ".disabled-link"],
            aliases: vec!["prihlasenie"],
        },
        PanelEntry {
            id: "user-form-panel",
            options: PanelOptions::modal(FORMS_GROUP).close_control("#close-user-form"),
            triggers: vec!["#btn-register", ".open-register"],
            aliases: vec!["uzivatel"],
        },
        PanelEntry {
            id: "reply-modal",
            options: PanelOptions {
                close_on_submit: true,
                prefill_scheme: PrefillScheme::Reply,
                ..PanelOptions::modal(FORMS_GROUP).close_control(r#"[data-close="reply-modal"]"#)
            }
            .focus("sprava"),
            triggers: vec![],
            aliases: vec!["odpoved"],
        },
        PanelEntry {
            id: "user-menu",
            options: PanelOptions {
                dismiss_on_outside_click: true,
                dismiss_on_escape: true,
                toggle_from_trigger: true,
                lock_scroll: Some(false),
                ..PanelOptions::default()
            }
            .close_control(r#"[data-close="user-menu"]"#),
            triggers: vec!["#user-menu-toggle"],
            aliases: vec![],
        },
    ]
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
