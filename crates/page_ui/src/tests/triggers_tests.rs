use super::*;
use crate::dom::MemoryDocument;

fn sample_payload() -> Prefill {
    Prefill::new()
        .with("id", "42")
        .with("typ", "Dopyt")
        .with("datum", "2024-05-01")
        .with("miesto", "Bratislava")
        .with("meno", "Ján")
        .with("email", "j@x.test")
}

#[test]
fn reply_subject_joins_descriptive_fields_with_one_separator() {
    let subject = reply_subject(&sample_payload()).expect("subject");
    assert_eq!(subject, "Re: Dopyt · 2024-05-01 · Bratislava");
}

#[test]
fn reply_subject_skips_blank_fields() {
    let payload = Prefill::new()
        .with("typ", "Dopyt")
        .with("datum", "")
        .with("miesto", "Košice");
    assert_eq!(
        reply_subject(&payload).as_deref(),
        Some("Re: Dopyt · Košice")
    );
    assert_eq!(reply_subject(&Prefill::new()), None);
}

#[test]
fn compose_reply_fills_both_naming_schemes() {
    let fields = compose_reply(&sample_payload());
    assert_eq!(fields.get("dopyt_id"), Some("42"));
    assert_eq!(fields.get("request_id"), Some("42"));
    assert_eq!(fields.get("email"), Some("j@x.test"));
    assert_eq!(fields.get("to_email"), Some("j@x.test"));
    assert_eq!(fields.get("subject"), fields.get("predmet"));
    assert_eq!(fields.get("message"), fields.get("sprava"));

    let message = fields.get("message").expect("message");
    assert!(message.starts_with("Dobrý deň, Ján,"));
    assert!(message.contains("Dopyt · 2024-05-01 · Bratislava"));
}

#[test]
fn compose_reply_keeps_unknown_keys_verbatim() {
    let fields = compose_reply(&Prefill::new().with("kapela", "Fatima"));
    assert_eq!(fields.get("kapela"), Some("Fatima"));
    assert_eq!(fields.get("message"), Some("Dobrý deň,\n\n"));
    assert_eq!(fields.get("subject"), None);
}

#[test]
fn apply_prefill_skips_fields_missing_from_panel() {
    let mut doc = MemoryDocument::new();
    let body = doc.body_node();
    let panel = doc.element(body, "div").id("reply-modal").build();
    let form = doc.element(panel, "form").build();
    let subject = doc.element(form, "input").attr("name", "subject").build();
    let message = doc.element(form, "textarea").attr("name", "sprava").build();

    let written = apply_prefill(&mut doc, panel, &sample_payload(), PrefillScheme::Reply);

    assert_eq!(written, 2);
    assert_eq!(
        doc.value(subject).as_deref(),
        Some("Re: Dopyt · 2024-05-01 · Bratislava")
    );
    assert!(doc.value(message).expect("message").contains("Ján"));
}

#[test]
fn scan_finds_markers_and_table_rules() {
    let mut doc = MemoryDocument::new();
    let body = doc.body_node();
    let login = doc.element(body, "a").class("open-login").build();
    let reply = doc
        .element(body, "button")
        .attr("data-open", "reply-modal")
        .attr("data-prefill-id", "7")
        .attr("data-prefill-", "ignored")
        .build();
    doc.element(body, "span").attr("data-open", "  ").build();

    let rules = vec![TriggerRule::new(".open-login", "modal-login").expect("rule")];
    let bindings = scan(&doc, &rules);

    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].element, login);
    assert_eq!(bindings[0].panel.as_str(), "modal-login");
    assert!(bindings[0].prefill.is_empty());
    assert_eq!(bindings[1].element, reply);
    assert_eq!(bindings[1].prefill, Prefill::new().with("id", "7"));
}

#[test]
fn binding_for_walks_up_from_nested_target() {
    let mut doc = MemoryDocument::new();
    let body = doc.body_node();
    let button = doc.element(body, "button").attr("data-open", "reply-modal").build();
    let icon = doc.element(button, "span").build();
    let elsewhere = doc.element(body, "p").build();

    let binding = binding_for(&doc, &[], icon).expect("binding");
    assert_eq!(binding.element, button);
    assert!(binding_for(&doc, &[], elsewhere).is_none());
}

#[test]
fn malformed_rule_selectors_are_dropped() {
    assert!(TriggerRule::new("[data-open", "reply-modal").is_none());
}
