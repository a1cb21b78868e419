//! Theme preference sync: applied (document), cached (local store) and
//! persisted (server) copies.
//!
//! A user change is applied and cached synchronously, then handed out as a
//! [`PersistRequest`] for the background worker. Completions only move the
//! state machine when they belong to the newest request, so a slow answer for
//! an older choice never shadows a newer one.

use shared::domain::Theme;
use storage::{KeyValueStore, PreferenceCache};
use tracing::{debug, info, warn};

use crate::{
    dom::{Document, NodeId},
    persistence::PersistError,
    selector::Selector,
};

pub const THEME_ATTRIBUTE: &str = "data-theme";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Applying { theme: Theme },
    Persisting { theme: Theme, seq: u64 },
    Settled { theme: Theme },
    PersistFailed { theme: Theme, error: PersistError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistRequest {
    pub theme: Theme,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    Settled(Theme),
    Failed { theme: Theme, error: PersistError },
    /// Completion of a request superseded by a newer change.
    Stale,
}

pub struct PreferenceSyncEngine<S: KeyValueStore> {
    cache: PreferenceCache<S>,
    controls: Selector,
    state: SyncState,
    applied: Option<Theme>,
    next_seq: u64,
}

impl<S: KeyValueStore> PreferenceSyncEngine<S> {
    pub fn new(cache: PreferenceCache<S>, controls: Selector) -> Self {
        Self {
            cache,
            controls,
            state: SyncState::Idle,
            applied: None,
            next_seq: 1,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn applied(&self) -> Option<Theme> {
        self.applied
    }

    pub fn is_persisting(&self) -> bool {
        matches!(self.state, SyncState::Persisting { .. })
    }

    pub fn cache(&self) -> &PreferenceCache<S> {
        &self.cache
    }

    pub fn is_control<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        doc.matches(node, &self.controls)
    }

    /// Applies the cached theme before anything touches the network.
    pub fn read_initial<D: Document + ?Sized>(&mut self, doc: &mut D) -> Option<Theme> {
        let theme = self.cache.theme()?;
        apply_theme(doc, theme);
        self.reflect(doc, theme, None);
        self.applied = Some(theme);
        debug!(%theme, "applied cached theme");
        Some(theme)
    }

    /// Handles a change on a theme control. Returns the request to persist,
    /// or `None` when the value is not a known theme.
    pub fn on_user_change<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        raw: &str,
        source: Option<NodeId>,
    ) -> Option<PersistRequest> {
        let theme = match raw.parse::<Theme>() {
            Ok(theme) => theme,
            Err(err) => {
                debug!("ignoring theme change: {err}");
                return None;
            }
        };

        self.state = SyncState::Applying { theme };
        apply_theme(doc, theme);
        self.reflect(doc, theme, source);
        self.applied = Some(theme);
        if let Err(err) = self.cache.store_theme(theme) {
            warn!(%theme, "failed to cache theme: {err}");
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.state = SyncState::Persisting { theme, seq };
        debug!(%theme, seq, "theme applied, persisting");
        Some(PersistRequest { theme, seq })
    }

    /// Folds a persistence outcome into the state machine. Applied and cached
    /// values are never rolled back.
    pub fn on_persist_outcome(
        &mut self,
        request: PersistRequest,
        outcome: Result<(), PersistError>,
    ) -> Reconciled {
        let current = match &self.state {
            SyncState::Persisting { seq, .. } => Some(*seq),
            _ => None,
        };
        if current != Some(request.seq) {
            debug!(
                theme = %request.theme,
                seq = request.seq,
                "superseded theme submission finished: {outcome:?}"
            );
            return Reconciled::Stale;
        }

        match outcome {
            Ok(()) => {
                info!(theme = %request.theme, "theme persisted");
                self.state = SyncState::Settled {
                    theme: request.theme,
                };
                Reconciled::Settled(request.theme)
            }
            Err(error) => {
                warn!(theme = %request.theme, "theme not persisted, keeping local choice: {error}");
                self.state = SyncState::PersistFailed {
                    theme: request.theme,
                    error: error.clone(),
                };
                Reconciled::Failed {
                    theme: request.theme,
                    error,
                }
            }
        }
    }

    /// Keeps every other control for the same choice in agreement.
    fn reflect<D: Document + ?Sized>(&self, doc: &mut D, theme: Theme, source: Option<NodeId>) {
        for control in doc.query_all(doc.root(), &self.controls) {
            if Some(control) == source {
                continue;
            }
            let checkable = doc
                .attribute(control, "type")
                .is_some_and(|kind| kind == "radio" || kind == "checkbox");
            if checkable {
                let selected = doc.attribute(control, "value").as_deref() == Some(theme.as_str());
                doc.set_checked(control, selected);
            } else {
                doc.set_value(control, theme.as_str());
            }
        }
    }
}

pub fn apply_theme<D: Document + ?Sized>(doc: &mut D, theme: Theme) {
    let root = doc.root();
    match theme.document_attribute() {
        Some(value) => doc.set_attribute(root, THEME_ATTRIBUTE, value),
        None => doc.remove_attribute(root, THEME_ATTRIBUTE),
    }
}

#[cfg(test)]
#[path = "tests/preferences_tests.rs"]
mod tests;
