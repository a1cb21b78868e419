//! The page's single UI controller: owns the document mirror, the panel
//! registry, trigger rules, the theme engine, and transient notices.
//!
//! Events are delegated: one handler per event type inspects the target's
//! ancestry, so triggers inserted after startup need no registration.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use shared::domain::{PanelId, Prefill};
use storage::{KeyValueStore, PreferenceCache};
use tracing::{debug, info, warn};

use crate::{
    bridge::{BackendCommand, BackendLink, UiEvent},
    config::UiConfig,
    dom::{Document, NodeId},
    events::{natively_activated, DomEvent, EventOutcome},
    notices::{NoticeBoard, NoticeLevel, FLASH_CONTAINER_ID},
    panels::{PanelController, PanelOptions},
    persistence::{describe_persist_failure, PersistError},
    preferences::{PersistRequest, PreferenceSyncEngine, Reconciled},
    registry::{
        site_panels, PanelEntry, AUTO_OPEN_ATTRIBUTE, AUTO_OPEN_QUERY, NAV_SELECTOR,
        NAV_TOGGLE_SELECTOR,
    },
    selector::Selector,
    triggers::{binding_for, scan, TriggerBinding, TriggerRule},
};

const NAV_ACTIVE_CLASS: &str = "active";

pub struct UiController<D: Document, S: KeyValueStore> {
    doc: D,
    panels: PanelController,
    rules: Vec<TriggerRule>,
    bindings: Vec<TriggerBinding>,
    aliases: HashMap<String, PanelId>,
    nav: Selector,
    nav_toggle: Selector,
    preferences: PreferenceSyncEngine<S>,
    notices: NoticeBoard,
    backend: Option<BackendLink>,
    now: Duration,
}

impl<D: Document, S: KeyValueStore> UiController<D, S> {
    /// Startup with the site's registration table.
    pub fn start(doc: D, store: S, config: &UiConfig, backend: Option<BackendLink>) -> Self {
        Self::start_with_table(doc, store, site_panels(), config, backend)
    }

    pub fn start_with_table(
        doc: D,
        store: S,
        table: Vec<PanelEntry>,
        config: &UiConfig,
        backend: Option<BackendLink>,
    ) -> Self {
        let controls = Selector::parse(&config.theme_control_selector).unwrap_or_else(|err| {
            warn!("theme control selector rejected, using [name=\"theme\"]: {err}");
            Selector::attr_eq("name", "theme")
        });
        let cache = PreferenceCache::with_key(store, config.cache_key.clone(), config.cache_ttl());

        let mut controller = Self {
            doc,
            panels: PanelController::new(),
            rules: Vec::new(),
            bindings: Vec::new(),
            aliases: HashMap::new(),
            nav: Selector::class("main-nav"),
            nav_toggle: Selector::class("hamburger"),
            preferences: PreferenceSyncEngine::new(cache, controls),
            notices: NoticeBoard::new(config.notice_fade_after(), config.notice_remove_after()),
            backend,
            now: Duration::ZERO,
        };
        if let Ok(nav) = Selector::parse(NAV_SELECTOR) {
            controller.nav = nav;
        }
        if let Ok(toggle) = Selector::parse(NAV_TOGGLE_SELECTOR) {
            controller.nav_toggle = toggle;
        }

        controller.preferences.read_initial(&mut controller.doc);
        for entry in table {
            controller.register(entry.id, entry.options, &entry.triggers, &entry.aliases);
        }
        controller.bindings = scan(&controller.doc, &controller.rules);
        if let Some(flash) = controller.doc.element_by_id(FLASH_CONTAINER_ID) {
            controller.notices.adopt(flash, Duration::ZERO);
        }
        controller.auto_open();
        info!(
            panels = controller.panels.open_panels().len(),
            bindings = controller.bindings.len(),
            "page controller started"
        );
        controller
    }

    /// Declares a panel plus the selectors and directive aliases that open it.
    pub fn register(
        &mut self,
        id: &str,
        options: PanelOptions,
        triggers: &[&str],
        aliases: &[&str],
    ) -> bool {
        let present = self.panels.register(&self.doc, id, options);
        self.rules
            .extend(triggers.iter().filter_map(|selector| TriggerRule::new(selector, id)));
        for alias in aliases {
            self.aliases.insert((*alias).to_string(), PanelId::from(id));
        }
        present
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn panels(&self) -> &PanelController {
        &self.panels
    }

    pub fn preferences(&self) -> &PreferenceSyncEngine<S> {
        &self.preferences
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Triggers found on the page at startup.
    pub fn bindings(&self) -> &[TriggerBinding] {
        &self.bindings
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.panels.is_open(id)
    }

    pub fn open(&mut self, id: &str, prefill: Option<&Prefill>) -> bool {
        self.panels.open(&mut self.doc, id, prefill, None)
    }

    pub fn close(&mut self, id: &str) -> bool {
        self.panels.close(&mut self.doc, id)
    }

    pub fn close_all(&mut self) -> usize {
        self.panels.close_all(&mut self.doc)
    }

    /// Opens a panel by id or directive alias, for other page scripts.
    pub fn open_panel(&mut self, name: &str) -> bool {
        let id = self
            .aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| PanelId::from(name));
        self.panels.open(&mut self.doc, id.as_str(), None, None)
    }

    /// Flips the responsive navigation. Returns the new expanded state.
    pub fn toggle_menu(&mut self) -> bool {
        let root = self.doc.root();
        let Some(nav) = self.doc.query(root, &self.nav) else {
            return false;
        };
        let expanded = self.doc.toggle_class(nav, NAV_ACTIVE_CLASS);
        let value = if expanded { "true" } else { "false" };
        for toggle in self.doc.query_all(root, &self.nav_toggle) {
            self.doc.set_attribute(toggle, "aria-expanded", value);
        }
        expanded
    }

    pub fn handle_event(&mut self, event: DomEvent) -> EventOutcome {
        match event {
            DomEvent::Click { target } => self.on_click(target),
            DomEvent::KeyDown { target, key } => self.on_keydown(target, &key),
            DomEvent::Change { target } => self.on_change(target),
            DomEvent::Submit { target } => self.on_submit(target),
        }
    }

    /// Advances the host clock: runs deferred focus and notice timers.
    pub fn tick(&mut self, now: Duration) {
        self.now = self.now.max(now);
        self.panels.run_deferred(&mut self.doc);
        self.notices.tick(&mut self.doc, self.now);
    }

    /// Drains worker outcomes without blocking.
    pub fn pump_backend_events(&mut self) -> usize {
        let mut drained = Vec::new();
        if let Some(link) = &self.backend {
            while let Ok(event) = link.events().try_recv() {
                drained.push(event);
            }
        }
        let count = drained.len();
        for event in drained {
            self.on_backend_event(event);
        }
        count
    }

    /// Blocks until no theme submission is pending or `timeout` elapses.
    /// Returns `true` when settled.
    pub fn wait_until_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.preferences.is_persisting() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let event = match &self.backend {
                Some(link) => link.events().recv_timeout(remaining).ok(),
                None => return false,
            };
            match event {
                Some(event) => self.on_backend_event(event),
                None => return !self.preferences.is_persisting(),
            }
        }
    }

    fn on_click(&mut self, target: NodeId) -> EventOutcome {
        let dismissed = self.notices.dismiss_all(&mut self.doc);

        let outside = self.panels.outside_click_hits(&self.doc, target);
        let binding = binding_for(&self.doc, &self.rules, target);
        let activated = binding.as_ref().map(|binding| binding.panel.clone());
        for id in outside.iter().filter(|id| Some(*id) != activated.as_ref()) {
            self.panels.close(&mut self.doc, id.as_str());
        }

        if self.doc.closest(target, &self.nav_toggle).is_some() {
            self.toggle_menu();
            return EventOutcome::CONSUMED;
        }

        if let Some(binding) = binding {
            if self.activate(&binding) {
                return EventOutcome::CONSUMED;
            }
        }

        if let Some(id) = self.panels.close_control_hit(&self.doc, target) {
            self.panels.close(&mut self.doc, id.as_str());
            return EventOutcome::HANDLED;
        }

        if dismissed > 0 || !outside.is_empty() {
            EventOutcome::HANDLED
        } else {
            EventOutcome::IGNORED
        }
    }

    fn on_keydown(&mut self, target: NodeId, key: &str) -> EventOutcome {
        match key {
            "Escape" | "Esc" => {
                if self.panels.close_for_escape(&mut self.doc) > 0 {
                    EventOutcome::HANDLED
                } else {
                    EventOutcome::IGNORED
                }
            }
            "Enter" | " " => {
                let Some(binding) = binding_for(&self.doc, &self.rules, target) else {
                    return EventOutcome::IGNORED;
                };
                if natively_activated(&self.doc, binding.element) {
                    return EventOutcome::IGNORED;
                }
                if self.activate(&binding) {
                    EventOutcome::CONSUMED
                } else {
                    EventOutcome::IGNORED
                }
            }
            _ => EventOutcome::IGNORED,
        }
    }

    fn on_change(&mut self, target: NodeId) -> EventOutcome {
        if !self.preferences.is_control(&self.doc, target) {
            return EventOutcome::IGNORED;
        }
        let Some(value) = self.doc.value(target) else {
            return EventOutcome::IGNORED;
        };
        match self
            .preferences
            .on_user_change(&mut self.doc, &value, Some(target))
        {
            Some(request) => {
                self.persist(request);
                EventOutcome::HANDLED
            }
            None => EventOutcome::IGNORED,
        }
    }

    /// The native submit proceeds; only the panel is closed.
    fn on_submit(&mut self, target: NodeId) -> EventOutcome {
        match self.panels.submit_hit(&self.doc, target) {
            Some(id) => {
                self.panels.close(&mut self.doc, id.as_str());
                EventOutcome::HANDLED
            }
            None => EventOutcome::IGNORED,
        }
    }

    fn activate(&mut self, binding: &TriggerBinding) -> bool {
        let id = binding.panel.as_str();
        let toggles = self
            .panels
            .options(id)
            .is_some_and(|options| options.toggle_from_trigger);
        if toggles && self.panels.is_open(id) {
            return self.panels.close(&mut self.doc, id);
        }
        let prefill = Some(&binding.prefill).filter(|prefill| !prefill.is_empty());
        self.panels
            .open(&mut self.doc, id, prefill, Some(binding.element))
    }

    fn auto_open(&mut self) {
        let from_body = self
            .doc
            .body()
            .and_then(|body| self.doc.attribute(body, AUTO_OPEN_ATTRIBUTE));
        let from_query = || {
            self.doc.location_query().and_then(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .find(|(key, _)| key == AUTO_OPEN_QUERY)
                    .map(|(_, value)| value.into_owned())
            })
        };
        let Some(directive) = from_body
            .or_else(from_query)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
        else {
            return;
        };

        self.panels.close_all(&mut self.doc);
        if self.open_panel(&directive) {
            debug!(directive = %directive, "auto-opened panel");
        } else {
            debug!(directive = %directive, "auto-open directive names no panel on this page");
        }
    }

    fn persist(&mut self, request: PersistRequest) {
        let dispatched = match &self.backend {
            Some(link) => link.dispatch(BackendCommand::PersistTheme(request)),
            None => Err(PersistError::Unavailable(
                "no persistence backend".to_string(),
            )),
        };
        if let Err(err) = dispatched {
            self.reconcile(request, Err(err));
        }
    }

    fn on_backend_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => debug!("persistence worker: {message}"),
            UiEvent::ThemePersisted(request) => self.reconcile(request, Ok(())),
            UiEvent::ThemePersistFailed { request, error } => {
                self.reconcile(request, Err(error))
            }
            UiEvent::WorkerFailed(message) => warn!("persistence worker failed: {message}"),
        }
    }

    fn reconcile(&mut self, request: PersistRequest, outcome: Result<(), PersistError>) {
        if let Reconciled::Failed { error, .. } =
            self.preferences.on_persist_outcome(request, outcome)
        {
            let text = describe_persist_failure(&error);
            self.notices
                .show(&mut self.doc, NoticeLevel::Warning, &text, self.now);
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
