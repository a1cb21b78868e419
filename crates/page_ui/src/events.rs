//! Discrete page events pushed by the host into the controller.

use crate::dom::{Document, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    Click { target: NodeId },
    KeyDown { target: NodeId, key: String },
    Change { target: NodeId },
    Submit { target: NodeId },
}

impl DomEvent {
    pub fn click(target: NodeId) -> Self {
        Self::Click { target }
    }

    pub fn key(target: NodeId, key: impl Into<String>) -> Self {
        Self::KeyDown {
            target,
            key: key.into(),
        }
    }

    pub fn change(target: NodeId) -> Self {
        Self::Change { target }
    }

    pub fn submit(target: NodeId) -> Self {
        Self::Submit { target }
    }

    pub fn target(&self) -> NodeId {
        match self {
            Self::Click { target }
            | Self::KeyDown { target, .. }
            | Self::Change { target }
            | Self::Submit { target } => *target,
        }
    }
}

/// What the host should do with the native event afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub handled: bool,
    pub prevent_default: bool,
}

impl EventOutcome {
    pub const IGNORED: Self = Self {
        handled: false,
        prevent_default: false,
    };
    pub const HANDLED: Self = Self {
        handled: true,
        prevent_default: false,
    };
    pub const CONSUMED: Self = Self {
        handled: true,
        prevent_default: true,
    };
}

/// Elements whose Enter/Space already produces a click in browsers.
pub fn natively_activated<D: Document + ?Sized>(doc: &D, node: NodeId) -> bool {
    match doc.tag(node).as_deref() {
        Some("button" | "input" | "select" | "textarea") => true,
        Some("a") => doc.attribute(node, "href").is_some(),
        _ => false,
    }
}
