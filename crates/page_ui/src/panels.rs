//! Overlay panels: registration, exclusive-group open/close, deferred focus,
//! and body scroll locking.

use std::collections::{HashMap, VecDeque};

use shared::domain::{GroupId, PanelId, Prefill, Visibility};
use tracing::{debug, warn};

use crate::{
    dom::{Document, NodeId},
    selector::Selector,
    triggers::{apply_prefill, PrefillScheme},
};

const OPEN_CLASS: &str = "open";

#[derive(Debug, Clone, Default)]
pub struct PanelOptions {
    pub exclusive_group: Option<GroupId>,
    pub dismiss_on_outside_click: bool,
    pub dismiss_on_escape: bool,
    pub close_control_selector: Option<String>,
    /// Field focused after opening; the first named field when unset or absent.
    pub focus_field: Option<String>,
    pub close_on_submit: bool,
    /// Locks body scrolling while open. Defaults to `true` for grouped panels.
    pub lock_scroll: Option<bool>,
    /// A trigger click on an already open panel closes it (slide-out menus).
    pub toggle_from_trigger: bool,
    pub prefill_scheme: PrefillScheme,
}

impl PanelOptions {
    /// Grouped modal defaults: outside click and Escape dismiss.
    pub fn modal(group: impl Into<String>) -> Self {
        Self {
            exclusive_group: Some(GroupId::new(group)),
            dismiss_on_outside_click: true,
            dismiss_on_escape: true,
            ..Self::default()
        }
    }

    pub fn close_control(mut self, selector: impl Into<String>) -> Self {
        self.close_control_selector = Some(selector.into());
        self
    }

    pub fn focus(mut self, field: impl Into<String>) -> Self {
        self.focus_field = Some(field.into());
        self
    }

    fn locks_scroll(&self) -> bool {
        self.lock_scroll.unwrap_or(self.exclusive_group.is_some())
    }
}

#[derive(Debug)]
struct Panel {
    id: PanelId,
    options: PanelOptions,
    close_control: Option<Selector>,
    anchor: Option<NodeId>,
    visibility: Visibility,
    opener: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Deferred {
    Focus(PanelId),
}

#[derive(Debug)]
struct ScrollLock {
    previous_overflow: Option<String>,
}

#[derive(Debug, Default)]
pub struct PanelController {
    panels: Vec<Panel>,
    index: HashMap<PanelId, usize>,
    deferred: VecDeque<Deferred>,
    scroll_lock: Option<ScrollLock>,
}

impl PanelController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a panel and binds it to the element with the same id.
    ///
    /// A panel whose anchor is missing stays registered as absent so later
    /// operations on it are silent no-ops. Re-registering replaces options.
    pub fn register<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        id: impl Into<PanelId>,
        options: PanelOptions,
    ) -> bool {
        let id = id.into();
        let anchor = doc.element_by_id(id.as_str());
        let close_control = options
            .close_control_selector
            .as_deref()
            .and_then(|raw| match Selector::parse(raw) {
                Ok(selector) => Some(selector),
                Err(err) => {
                    warn!(panel = %id, "ignoring close control selector: {err}");
                    None
                }
            });
        let visibility = match anchor {
            Some(anchor) if doc.has_class(anchor, OPEN_CLASS) => Visibility::Open,
            _ => Visibility::Closed,
        };
        if anchor.is_none() {
            debug!(panel = %id, "panel anchor not on this page");
        }

        let panel = Panel {
            id: id.clone(),
            options,
            close_control,
            anchor,
            visibility,
            opener: None,
        };
        match self.index.get(&id) {
            Some(&slot) => self.panels[slot] = panel,
            None => {
                self.index.insert(id, self.panels.len());
                self.panels.push(panel);
            }
        }
        anchor.is_some()
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.index.contains_key(&PanelId::from(id))
    }

    pub fn visibility(&self, id: &str) -> Option<Visibility> {
        self.panel(id).map(|panel| panel.visibility)
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.visibility(id) == Some(Visibility::Open)
    }

    pub fn open_panels(&self) -> Vec<PanelId> {
        self.panels
            .iter()
            .filter(|panel| panel.visibility == Visibility::Open)
            .map(|panel| panel.id.clone())
            .collect()
    }

    pub fn anchor(&self, id: &str) -> Option<NodeId> {
        self.panel(id).and_then(|panel| panel.anchor)
    }

    pub fn options(&self, id: &str) -> Option<&PanelOptions> {
        self.panel(id).map(|panel| &panel.options)
    }

    /// Opens `id`, closing the rest of its exclusive group first.
    ///
    /// `opener` is the activating trigger; it receives `aria-expanded`.
    pub fn open<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        id: &str,
        prefill: Option<&Prefill>,
        opener: Option<NodeId>,
    ) -> bool {
        let Some(&slot) = self.index.get(&PanelId::from(id)) else {
            debug!(panel = id, "open requested for unregistered panel");
            return false;
        };
        let Some(anchor) = self.panels[slot].anchor.filter(|a| doc.is_connected(*a)) else {
            debug!(panel = id, "open requested for absent panel");
            return false;
        };

        if let Some(group) = self.panels[slot].options.exclusive_group.clone() {
            let siblings: Vec<PanelId> = self
                .panels
                .iter()
                .filter(|panel| {
                    panel.id.as_str() != id
                        && panel.visibility == Visibility::Open
                        && panel.options.exclusive_group.as_ref() == Some(&group)
                })
                .map(|panel| panel.id.clone())
                .collect();
            for sibling in siblings {
                self.close(doc, sibling.as_str());
            }
        }

        if let Some(prefill) = prefill.filter(|prefill| !prefill.is_empty()) {
            let scheme = self.panels[slot].options.prefill_scheme;
            let written = apply_prefill(doc, anchor, prefill, scheme);
            debug!(panel = id, fields = written, "prefilled panel");
        }

        let panel = &mut self.panels[slot];
        if let Some(previous) = panel.opener.take().filter(|prev| Some(*prev) != opener) {
            doc.set_attribute(previous, "aria-expanded", "false");
        }
        if let Some(opener) = opener {
            doc.set_attribute(opener, "aria-expanded", "true");
            panel.opener = Some(opener);
        }
        doc.add_class(anchor, OPEN_CLASS);
        doc.set_attribute(anchor, "aria-hidden", "false");
        panel.visibility = Visibility::Open;
        let locks = panel.options.locks_scroll();

        if locks {
            self.lock_scroll(doc);
        }
        let task = Deferred::Focus(PanelId::from(id));
        if !self.deferred.contains(&task) {
            self.deferred.push_back(task);
        }
        debug!(panel = id, "panel opened");
        true
    }

    /// Hides `id`. Closing a closed or unknown panel changes nothing.
    pub fn close<D: Document + ?Sized>(&mut self, doc: &mut D, id: &str) -> bool {
        let Some(&slot) = self.index.get(&PanelId::from(id)) else {
            return false;
        };
        let panel = &mut self.panels[slot];
        if panel.visibility == Visibility::Closed {
            return false;
        }
        panel.visibility = Visibility::Closed;
        if let Some(anchor) = panel.anchor {
            doc.remove_class(anchor, OPEN_CLASS);
            doc.set_attribute(anchor, "aria-hidden", "true");
        }
        if let Some(opener) = panel.opener.take() {
            doc.set_attribute(opener, "aria-expanded", "false");
        }
        self.deferred
            .retain(|task| *task != Deferred::Focus(PanelId::from(id)));
        self.release_scroll_if_idle(doc);
        debug!(panel = id, "panel closed");
        true
    }

    pub fn close_all<D: Document + ?Sized>(&mut self, doc: &mut D) -> usize {
        let mut closed = 0;
        for id in self.open_panels() {
            if self.close(doc, id.as_str()) {
                closed += 1;
            }
        }
        closed
    }

    /// Closes every open panel that accepts Escape dismissal.
    pub fn close_for_escape<D: Document + ?Sized>(&mut self, doc: &mut D) -> usize {
        let targets: Vec<PanelId> = self
            .panels
            .iter()
            .filter(|panel| panel.visibility == Visibility::Open && panel.options.dismiss_on_escape)
            .map(|panel| panel.id.clone())
            .collect();
        let mut closed = 0;
        for id in targets {
            if self.close(doc, id.as_str()) {
                closed += 1;
            }
        }
        closed
    }

    /// Open panel whose explicit close control contains `target`.
    pub fn close_control_hit<D: Document + ?Sized>(&self, doc: &D, target: NodeId) -> Option<PanelId> {
        self.panels
            .iter()
            .filter(|panel| panel.visibility == Visibility::Open)
            .find(|panel| {
                panel
                    .close_control
                    .as_ref()
                    .is_some_and(|selector| doc.closest(target, selector).is_some())
            })
            .map(|panel| panel.id.clone())
    }

    /// Open panels for which a click on `target` is an outside click: the
    /// click landed on the panel's own backdrop or outside its subtree.
    pub fn outside_click_hits<D: Document + ?Sized>(&self, doc: &D, target: NodeId) -> Vec<PanelId> {
        self.panels
            .iter()
            .filter(|panel| {
                panel.visibility == Visibility::Open && panel.options.dismiss_on_outside_click
            })
            .filter(|panel| match panel.anchor {
                Some(anchor) => target == anchor || !doc.contains(anchor, target),
                None => false,
            })
            .map(|panel| panel.id.clone())
            .collect()
    }

    /// Open panel configured to close when a form inside it is submitted.
    pub fn submit_hit<D: Document + ?Sized>(&self, doc: &D, target: NodeId) -> Option<PanelId> {
        self.panels
            .iter()
            .filter(|panel| panel.visibility == Visibility::Open && panel.options.close_on_submit)
            .find(|panel| panel.anchor.is_some_and(|anchor| doc.contains(anchor, target)))
            .map(|panel| panel.id.clone())
    }

    pub fn has_deferred_work(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Runs work deferred by `open`, one scheduling tick after the visibility
    /// change was committed. Returns the number of tasks run.
    pub fn run_deferred<D: Document + ?Sized>(&mut self, doc: &mut D) -> usize {
        let mut ran = 0;
        while let Some(task) = self.deferred.pop_front() {
            ran += 1;
            match task {
                Deferred::Focus(id) => self.focus_panel(doc, id.as_str()),
            }
        }
        ran
    }

    fn focus_panel<D: Document + ?Sized>(&self, doc: &mut D, id: &str) {
        let Some(panel) = self.panel(id).filter(|p| p.visibility == Visibility::Open) else {
            return;
        };
        let Some(anchor) = panel.anchor else {
            return;
        };
        let target = panel
            .options
            .focus_field
            .as_deref()
            .and_then(|field| doc.field(anchor, field))
            .or_else(|| doc.query(anchor, &Selector::has_attr("name")));
        match target {
            Some(field) => doc.focus(field),
            None => debug!(panel = id, "no focusable field in panel"),
        }
    }

    fn lock_scroll<D: Document + ?Sized>(&mut self, doc: &mut D) {
        if self.scroll_lock.is_some() {
            return;
        }
        let Some(body) = doc.body() else {
            return;
        };
        self.scroll_lock = Some(ScrollLock {
            previous_overflow: doc.style(body, "overflow"),
        });
        doc.set_style(body, "overflow", Some("hidden"));
    }

    fn release_scroll_if_idle<D: Document + ?Sized>(&mut self, doc: &mut D) {
        let still_locked = self
            .panels
            .iter()
            .any(|panel| panel.visibility == Visibility::Open && panel.options.locks_scroll());
        if still_locked {
            return;
        }
        if let Some(lock) = self.scroll_lock.take() {
            if let Some(body) = doc.body() {
                doc.set_style(body, "overflow", lock.previous_overflow.as_deref());
            }
        }
    }

    fn panel(&self, id: &str) -> Option<&Panel> {
        self.index
            .get(&PanelId::from(id))
            .map(|&slot| &self.panels[slot])
    }
}

#[cfg(test)]
#[path = "tests/panels_tests.rs"]
mod tests;
