use super::*;
use crate::dom::MemoryDocument;

struct Page {
    doc: MemoryDocument,
    login: NodeId,
    register: NodeId,
    menu: NodeId,
    email: NodeId,
}

fn page() -> Page {
    let mut doc = MemoryDocument::new();
    let body = doc.body_node();
    doc.set_style(body, "overflow", Some("auto"));

    let login = doc.element(body, "div").id("modal-login").class("form-panel").build();
    let form = doc.element(login, "form").build();
    let email = doc.element(form, "input").attr("name", "email").build();
    doc.element(form, "input").attr("name", "heslo").build();
    doc.element(login, "button").id("close-login").build();

    let register = doc.element(body, "div").id("user-form-panel").build();
    doc.element(register, "input").attr("name", "meno").build();

    let menu = doc.element(body, "aside").id("user-menu").build();

    Page {
        doc,
        login,
        register,
        menu,
        email,
    }
}

fn controller(doc: &MemoryDocument) -> PanelController {
    let mut panels = PanelController::new();
    panels.register(doc, "modal-login", PanelOptions::modal("forms").close_control("#close-login"));
    panels.register(doc, "user-form-panel", PanelOptions::modal("forms"));
    panels.register(
        doc,
        "user-menu",
        PanelOptions {
            dismiss_on_escape: true,
            ..PanelOptions::default()
        },
    );
    panels
}

#[test]
fn opening_a_grouped_panel_closes_its_siblings() {
    let mut page = page();
    let mut panels = controller(&page.doc);

    assert!(panels.open(&mut page.doc, "modal-login", None, None));
    assert!(panels.open(&mut page.doc, "user-menu", None, None));
    assert!(panels.open(&mut page.doc, "user-form-panel", None, None));

    assert!(!panels.is_open("modal-login"));
    assert!(panels.is_open("user-form-panel"));
    assert!(panels.is_open("user-menu"), "ungrouped panel is untouched");
    assert!(!page.doc.has_class(page.login, "open"));
    assert_eq!(page.doc.attribute(page.login, "aria-hidden").as_deref(), Some("true"));
    assert!(page.doc.has_class(page.register, "open"));
    assert!(page.doc.has_class(page.menu, "open"));
}

#[test]
fn close_is_idempotent() {
    let mut page = page();
    let mut panels = controller(&page.doc);

    assert!(!panels.close(&mut page.doc, "modal-login"));
    assert_eq!(panels.visibility("modal-login"), Some(Visibility::Closed));
    assert_eq!(page.doc.attribute(page.login, "aria-hidden"), None);

    panels.open(&mut page.doc, "modal-login", None, None);
    assert!(panels.close(&mut page.doc, "modal-login"));
    assert!(!panels.close(&mut page.doc, "modal-login"));
    assert!(!panels.close(&mut page.doc, "never-registered"));
}

#[test]
fn focus_moves_one_tick_after_open() {
    let mut page = page();
    let mut panels = controller(&page.doc);

    panels.open(&mut page.doc, "modal-login", None, None);
    assert_eq!(page.doc.active_element(), None);
    assert!(panels.has_deferred_work());

    assert_eq!(panels.run_deferred(&mut page.doc), 1);
    assert_eq!(page.doc.active_element(), Some(page.email));
}

#[test]
fn focus_is_dropped_when_panel_closes_before_the_tick() {
    let mut page = page();
    let mut panels = controller(&page.doc);

    panels.open(&mut page.doc, "modal-login", None, None);
    panels.close(&mut page.doc, "modal-login");
    assert!(!panels.has_deferred_work());
    panels.run_deferred(&mut page.doc);
    assert_eq!(page.doc.active_element(), None);
}

#[test]
fn configured_focus_field_wins() {
    let mut page = page();
    let mut panels = PanelController::new();
    panels.register(&page.doc, "modal-login", PanelOptions::modal("forms").focus("heslo"));

    panels.open(&mut page.doc, "modal-login", None, None);
    panels.run_deferred(&mut page.doc);

    let focused = page.doc.active_element().expect("focused");
    assert_eq!(page.doc.attribute(focused, "name").as_deref(), Some("heslo"));
}

#[test]
fn scroll_lock_restores_previous_overflow_exactly() {
    let mut page = page();
    let mut panels = controller(&page.doc);
    let body = page.doc.body_node();

    panels.open(&mut page.doc, "modal-login", None, None);
    assert_eq!(page.doc.style(body, "overflow").as_deref(), Some("hidden"));

    panels.open(&mut page.doc, "user-form-panel", None, None);
    assert_eq!(page.doc.style(body, "overflow").as_deref(), Some("hidden"));

    panels.close(&mut page.doc, "user-form-panel");
    assert_eq!(page.doc.style(body, "overflow").as_deref(), Some("auto"));
}

#[test]
fn ungrouped_panels_do_not_lock_scroll() {
    let mut page = page();
    let mut panels = controller(&page.doc);
    let body = page.doc.body_node();
    page.doc.set_style(body, "overflow", None);

    panels.open(&mut page.doc, "user-menu", None, None);
    assert_eq!(page.doc.style(body, "overflow"), None);
}

#[test]
fn opener_tracks_aria_expanded() {
    let mut page = page();
    let mut panels = controller(&page.doc);
    let body = page.doc.body_node();
    let toggle = page.doc.element(body, "button").id("user-menu-toggle").build();

    panels.open(&mut page.doc, "user-menu", None, Some(toggle));
    assert_eq!(page.doc.attribute(toggle, "aria-expanded").as_deref(), Some("true"));

    panels.close(&mut page.doc, "user-menu");
    assert_eq!(page.doc.attribute(toggle, "aria-expanded").as_deref(), Some("false"));
}

#[test]
fn absent_panels_are_silent_no_ops() {
    let mut page = page();
    let mut panels = controller(&page.doc);

    assert!(!panels.register(&page.doc, "form-hladam-kapelu", PanelOptions::modal("forms")));
    assert!(panels.is_registered("form-hladam-kapelu"));
    assert!(!panels.open(&mut page.doc, "form-hladam-kapelu", None, None));
    assert!(!panels.open(&mut page.doc, "unknown", None, None));
    assert!(panels.open_panels().is_empty());
}

#[test]
fn escape_only_closes_panels_that_accept_it() {
    let mut page = page();
    let mut panels = controller(&page.doc);
    panels.register(&page.doc, "user-menu", PanelOptions::default());

    panels.open(&mut page.doc, "modal-login", None, None);
    panels.open(&mut page.doc, "user-menu", None, None);

    assert_eq!(panels.close_for_escape(&mut page.doc), 1);
    assert!(panels.is_open("user-menu"));
    assert_eq!(panels.close_all(&mut page.doc), 1);
    assert!(panels.open_panels().is_empty());
}

#[test]
fn outside_click_covers_backdrop_and_foreign_targets() {
    let mut page = page();
    let mut panels = controller(&page.doc);
    panels.open(&mut page.doc, "modal-login", None, None);

    assert!(panels.outside_click_hits(&page.doc, page.email).is_empty());
    assert_eq!(
        panels.outside_click_hits(&page.doc, page.login),
        vec![PanelId::from("modal-login")]
    );
    assert_eq!(
        panels.outside_click_hits(&page.doc, page.menu),
        vec![PanelId::from("modal-login")]
    );
}

#[test]
fn close_control_is_resolved_through_ancestry() {
    let mut page = page();
    let mut panels = controller(&page.doc);
    let close = page.doc.element_by_id("close-login").expect("close");
    let icon = page.doc.element(close, "svg").build();

    assert_eq!(panels.close_control_hit(&page.doc, icon), None);
    panels.open(&mut page.doc, "modal-login", None, None);
    assert_eq!(
        panels.close_control_hit(&page.doc, icon),
        Some(PanelId::from("modal-login"))
    );
}

#[test]
fn prefill_writes_into_named_fields() {
    let mut page = page();
    let mut panels = controller(&page.doc);
    let prefill = Prefill::new().with("email", "j@x.test").with("missing", "x");

    panels.open(&mut page.doc, "modal-login", Some(&prefill), None);
    assert_eq!(page.doc.value(page.email).as_deref(), Some("j@x.test"));
    assert!(panels.is_open("modal-login"));
}
