//! Declarative trigger markers and the prefill payloads they carry.

use shared::domain::{PanelId, Prefill};
use tracing::{debug, warn};

use crate::{
    dom::{Document, NodeId},
    selector::Selector,
};

/// Marker naming the panel an element opens.
pub const OPEN_MARKER: &str = "data-open";
/// Prefix of attributes copied into the target panel's fields.
pub const PREFILL_PREFIX: &str = "data-prefill-";

const SUBJECT_SEPARATOR: &str = " · ";
const REPLY_KEYS: [&str; 6] = ["id", "typ", "datum", "miesto", "meno", "email"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefillScheme {
    /// Payload keys are field names.
    #[default]
    Direct,
    /// Inquiry reply payload: request id, counterpart, and descriptive fields
    /// composed into subject and message under both field-naming schemes.
    Reply,
}

/// Maps an element selector to the panel it opens.
#[derive(Debug, Clone)]
pub struct TriggerRule {
    pub selector: Selector,
    pub panel: PanelId,
}

impl TriggerRule {
    pub fn new(selector: &str, panel: impl Into<PanelId>) -> Option<Self> {
        let panel = panel.into();
        match Selector::parse(selector) {
            Ok(selector) => Some(Self { selector, panel }),
            Err(err) => {
                warn!(panel = %panel, "ignoring trigger selector: {err}");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerBinding {
    pub element: NodeId,
    pub panel: PanelId,
    pub prefill: Prefill,
}

/// Nearest trigger at or above `target`. The `data-open` marker wins over
/// table rules on the same element.
pub fn binding_for<D: Document + ?Sized>(
    doc: &D,
    rules: &[TriggerRule],
    target: NodeId,
) -> Option<TriggerBinding> {
    let mut current = Some(target);
    while let Some(node) = current {
        if let Some(binding) = binding_at(doc, rules, node) {
            return Some(binding);
        }
        current = doc.parent(node);
    }
    None
}

/// Every trigger currently on the page, in document order.
pub fn scan<D: Document + ?Sized>(doc: &D, rules: &[TriggerRule]) -> Vec<TriggerBinding> {
    let mut stack = vec![doc.root()];
    let mut bindings = Vec::new();
    while let Some(node) = stack.pop() {
        if let Some(binding) = binding_at(doc, rules, node) {
            bindings.push(binding);
        }
        stack.extend(doc.children(node).into_iter().rev());
    }
    bindings
}

fn binding_at<D: Document + ?Sized>(
    doc: &D,
    rules: &[TriggerRule],
    node: NodeId,
) -> Option<TriggerBinding> {
    let panel = doc
        .attribute(node, OPEN_MARKER)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PanelId::from)
        .or_else(|| {
            rules
                .iter()
                .find(|rule| rule.selector.matches(doc, node))
                .map(|rule| rule.panel.clone())
        })?;
    Some(TriggerBinding {
        element: node,
        panel,
        prefill: prefill_from_element(doc, node),
    })
}

pub fn prefill_from_element<D: Document + ?Sized>(doc: &D, node: NodeId) -> Prefill {
    doc.attributes(node)
        .into_iter()
        .filter_map(|(name, value)| {
            name.strip_prefix(PREFILL_PREFIX)
                .filter(|field| !field.is_empty())
                .map(|field| (field.to_string(), value))
        })
        .collect()
}

/// Writes `prefill` into the named fields under `panel`. Fields missing
/// from the panel are skipped. Returns how many fields were written.
pub fn apply_prefill<D: Document + ?Sized>(
    doc: &mut D,
    panel: NodeId,
    prefill: &Prefill,
    scheme: PrefillScheme,
) -> usize {
    let expanded = match scheme {
        PrefillScheme::Direct => prefill.clone(),
        PrefillScheme::Reply => compose_reply(prefill),
    };

    let mut written = 0;
    for (name, value) in expanded.iter() {
        match doc.field(panel, name) {
            Some(field) => {
                doc.set_value(field, value);
                written += 1;
            }
            None => debug!(field = name, "prefill field not in panel"),
        }
    }
    written
}

/// Subject line composed from the non-empty descriptive fields.
pub fn reply_subject(payload: &Prefill) -> Option<String> {
    let parts: Vec<&str> = ["typ", "datum", "miesto"]
        .into_iter()
        .filter_map(|key| payload.non_empty(key))
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("Re: {}", parts.join(SUBJECT_SEPARATOR)))
}

pub fn reply_greeting(payload: &Prefill) -> String {
    match payload.non_empty("meno") {
        Some(name) => format!("Dobrý deň, {name},"),
        None => "Dobrý deň,".to_string(),
    }
}

/// Expands a reply payload into concrete field values under both naming
/// schemes in use on the site (`dopyt_id`/`request_id`, `email`/`to_email`,
/// `subject`/`predmet`, `message`/`sprava`).
pub fn compose_reply(payload: &Prefill) -> Prefill {
    let mut fields = Prefill::new();

    if let Some(id) = payload.non_empty("id") {
        fields.insert("dopyt_id", id);
        fields.insert("request_id", id);
    }
    if let Some(email) = payload.non_empty("email") {
        fields.insert("email", email);
        fields.insert("to_email", email);
    }

    let subject = reply_subject(payload);
    if let Some(subject) = &subject {
        fields.insert("subject", subject.as_str());
        fields.insert("predmet", subject.as_str());
    }

    let mut message = reply_greeting(payload);
    message.push_str("\n\n");
    if let Some(subject) = &subject {
        let topic = subject.trim_start_matches("Re: ");
        message.push_str(&format!("reagujem na váš dopyt ({topic}).\n"));
    }
    fields.insert("message", message.as_str());
    fields.insert("sprava", message.as_str());

    for (key, value) in payload.iter() {
        if !REPLY_KEYS.contains(&key) {
            fields.insert(key, value);
        }
    }
    fields
}

#[cfg(test)]
#[path = "tests/triggers_tests.rs"]
mod tests;
