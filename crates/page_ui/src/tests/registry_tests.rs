use super::*;
use std::collections::HashSet;

use crate::selector::Selector;

#[test]
fn panel_ids_and_aliases_are_unique() {
    let panels = site_panels();
    let ids: HashSet<_> = panels.iter().map(|entry| entry.id).collect();
    assert_eq!(ids.len(), panels.len());

    let aliases: Vec<_> = panels.iter().flat_map(|entry| entry.aliases.clone()).collect();
    let unique: HashSet<_> = aliases.iter().collect();
    assert_eq!(unique.len(), aliases.len());
}

#[test]
fn every_selector_in_the_table_parses() {
    for entry in site_panels() {
        for trigger in &entry.triggers {
            assert!(Selector::parse(trigger).is_ok(), "{}: {trigger}", entry.id);
        }
        if let Some(close) = &entry.options.close_control_selector {
            assert!(Selector::parse(close).is_ok(), "{}: {close}", entry.id);
        }
    }
    assert!(Selector::parse(NAV_SELECTOR).is_ok());
    assert!(Selector::parse(NAV_TOGGLE_SELECTOR).is_ok());
}

#[test]
fn forms_share_one_exclusive_group_and_menu_stands_alone() {
    let panels = site_panels();
    let grouped: Vec<_> = panels
        .iter()
        .filter(|entry| entry.options.exclusive_group.as_ref().map(|g| g.as_str()) == Some(FORMS_GROUP))
        .map(|entry| entry.id)
        .collect();
    assert_eq!(
        grouped,
        vec!["form-hladam-kapelu", "modal-login", "user-form-panel", "reply-modal"]
    );

    let menu = panels.iter().find(|entry| entry.id == "user-menu").expect("menu");
    assert!(menu.options.exclusive_group.is_none());
    assert!(menu.options.toggle_from_trigger);
}
