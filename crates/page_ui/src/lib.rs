//! Page behaviour layer: overlay panels, declarative triggers, theme
//! preference sync and transient notices, driven by host DOM events.

pub mod bridge;
pub mod config;
pub mod controller;
pub mod dom;
pub mod events;
pub mod notices;
pub mod panels;
pub mod persistence;
pub mod preferences;
pub mod registry;
pub mod selector;
pub mod triggers;

pub use bridge::{launch, launch_http, BackendCommand, BackendLink, UiEvent};
pub use config::{load_ui_config, UiConfig};
pub use controller::UiController;
pub use dom::{Document, MemoryDocument, NodeId};
pub use events::{DomEvent, EventOutcome};
pub use panels::{PanelController, PanelOptions};
pub use persistence::{HttpThemePersistence, PersistError, ThemePersistence};
pub use preferences::{PreferenceSyncEngine, SyncState};
pub use selector::Selector;
