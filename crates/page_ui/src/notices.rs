//! Transient notices (flash messages and sync warnings).
//!
//! A notice fades after `fade_after` and is removed `remove_after` later.
//! The first click anywhere removes every live notice. The element is the
//! timer: once it leaves the document its pending steps are dropped.

use std::time::Duration;

use tracing::debug;

use crate::dom::{Document, NodeId};

pub const FLASH_CONTAINER_ID: &str = "flash-container";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

impl NoticeLevel {
    fn class(self) -> &'static str {
        match self {
            NoticeLevel::Info => "flash-info",
            NoticeLevel::Warning => "flash-warning",
        }
    }
}

#[derive(Debug)]
struct Notice {
    node: NodeId,
    shown_at: Duration,
    faded: bool,
}

#[derive(Debug)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
    fade_after: Duration,
    remove_after: Duration,
}

impl NoticeBoard {
    pub fn new(fade_after: Duration, remove_after: Duration) -> Self {
        Self {
            notices: Vec::new(),
            fade_after,
            remove_after,
        }
    }

    /// Starts the dismiss timer for a notice already rendered by the page.
    pub fn adopt(&mut self, node: NodeId, now: Duration) {
        if self.notices.iter().any(|notice| notice.node == node) {
            return;
        }
        self.notices.push(Notice {
            node,
            shown_at: now,
            faded: false,
        });
    }

    pub fn show<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        level: NoticeLevel,
        text: &str,
        now: Duration,
    ) -> Option<NodeId> {
        let body = doc.body()?;
        let node = doc.create_element(body, "div")?;
        doc.add_class(node, "flash");
        doc.add_class(node, level.class());
        doc.set_attribute(node, "role", "status");
        doc.set_text(node, text);
        self.adopt(node, now);
        Some(node)
    }

    pub fn live(&self) -> usize {
        self.notices.len()
    }

    /// Advances timers to `now`. Returns how many notices were removed.
    pub fn tick<D: Document + ?Sized>(&mut self, doc: &mut D, now: Duration) -> usize {
        self.notices.retain(|notice| doc.is_connected(notice.node));

        let mut removed = 0;
        let fade_after = self.fade_after;
        let remove_at = self.fade_after + self.remove_after;
        self.notices.retain_mut(|notice| {
            let elapsed = now.saturating_sub(notice.shown_at);
            if elapsed >= remove_at {
                doc.remove(notice.node);
                removed += 1;
                return false;
            }
            if elapsed >= fade_after && !notice.faded {
                doc.set_style(notice.node, "opacity", Some("0"));
                notice.faded = true;
            }
            true
        });
        if removed > 0 {
            debug!(removed, "notices expired");
        }
        removed
    }

    pub fn dismiss_all<D: Document + ?Sized>(&mut self, doc: &mut D) -> usize {
        let mut count = 0;
        for notice in self.notices.drain(..) {
            if doc.is_connected(notice.node) {
                doc.remove(notice.node);
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
#[path = "tests/notices_tests.rs"]
mod tests;
