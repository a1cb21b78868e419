//! Page contract consumed by the controller.
//!
//! The host owns the real DOM and mirrors it through [`Document`]. Every
//! lookup returns `Option`/empty collections: an element that is not on the
//! page is a feature that is not on the page.

use std::collections::BTreeMap;

use crate::selector::Selector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

pub trait Document {
    /// The `<html>` element.
    fn root(&self) -> NodeId;
    fn body(&self) -> Option<NodeId>;
    fn tag(&self, node: NodeId) -> Option<String>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    fn is_connected(&self, node: NodeId) -> bool;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn remove_attribute(&mut self, node: NodeId, name: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);

    fn style(&self, node: NodeId, property: &str) -> Option<String>;
    /// `None` clears the inline property.
    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>);

    fn value(&self, node: NodeId) -> Option<String>;
    fn set_value(&mut self, node: NodeId, value: &str);
    fn is_checked(&self, node: NodeId) -> bool;
    fn set_checked(&mut self, node: NodeId, checked: bool);
    fn text(&self, node: NodeId) -> Option<String>;
    fn set_text(&mut self, node: NodeId, text: &str);

    fn focus(&mut self, node: NodeId);
    fn active_element(&self) -> Option<NodeId>;

    fn create_element(&mut self, parent: NodeId, tag: &str) -> Option<NodeId>;
    fn remove(&mut self, node: NodeId);

    /// Query string of the page URL without the leading `?`.
    fn location_query(&self) -> Option<String>;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query(self.root(), &Selector::id(id))
    }

    /// Returns whether the class is present afterwards.
    fn toggle_class(&mut self, node: NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            true
        }
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self, node)
    }

    /// Descendants of `scope` (excluding `scope`) in document order.
    fn query_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.matches(node, selector) {
                found.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        found
    }

    fn query(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.query_all(scope, selector).into_iter().next()
    }

    /// `node` or its nearest ancestor matching `selector`.
    fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if self.matches(candidate, selector) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Inclusive containment, like `Node.contains`.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }

    /// First descendant of `scope` whose `name` attribute equals `name`.
    fn field(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        self.query(scope, &Selector::attr_eq("name", name))
    }
}

#[derive(Debug, Clone, Default)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    value: Option<String>,
    checked: bool,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document used by tests, the harness, and hosts that mirror
/// a browser DOM.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Element>,
    body: NodeId,
    focused: Option<NodeId>,
    query: Option<String>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![Element {
                tag: "html".to_string(),
                ..Element::default()
            }],
            body: NodeId(0),
            focused: None,
            query: None,
        };
        doc.body = doc.push(NodeId(0), "body");
        doc
    }

    pub fn with_location_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = Some(query.trim_start_matches('?').to_string());
        self
    }

    /// Starts building a new element under `parent`.
    pub fn element(&mut self, parent: NodeId, tag: &str) -> ElementBuilder<'_> {
        let node = self.push(parent, tag);
        ElementBuilder { doc: self, node }
    }

    pub fn body_node(&self) -> NodeId {
        self.body
    }

    fn push(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = NodeId(self.nodes.len());
        self.nodes.push(Element {
            tag: tag.to_ascii_lowercase(),
            parent: Some(parent),
            ..Element::default()
        });
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.push(node);
        }
        node
    }

    fn get(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node.0)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(node.0)
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body).filter(|body| self.is_connected(*body))
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        self.get(node).map(|element| element.tag.clone())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|element| element.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|element| element.children.clone())
            .unwrap_or_default()
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let element = self.get(node)?;
        if name == "class" {
            return Some(element.classes.join(" ")).filter(|classes| !classes.is_empty());
        }
        element.attributes.get(name).cloned()
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.get(node)
            .map(|element| {
                element
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if name == "class" {
            if let Some(element) = self.get_mut(node) {
                element.classes = value.split_whitespace().map(str::to_string).collect();
            }
            return;
        }
        if let Some(element) = self.get_mut(node) {
            element.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.get_mut(node) {
            element.attributes.remove(name);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node)
            .is_some_and(|element| element.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.get_mut(node) {
            if !element.classes.iter().any(|c| c == class) {
                element.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.get_mut(node) {
            element.classes.retain(|c| c != class);
        }
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.get(node)
            .and_then(|element| element.style.get(property).cloned())
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>) {
        if let Some(element) = self.get_mut(node) {
            match value {
                Some(value) => {
                    element.style.insert(property.to_string(), value.to_string());
                }
                None => {
                    element.style.remove(property);
                }
            }
        }
    }

    fn value(&self, node: NodeId) -> Option<String> {
        let element = self.get(node)?;
        element
            .value
            .clone()
            .or_else(|| element.attributes.get("value").cloned())
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.get_mut(node) {
            element.value = Some(value.to_string());
        }
    }

    fn is_checked(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|element| element.checked)
    }

    fn set_checked(&mut self, node: NodeId, checked: bool) {
        if let Some(element) = self.get_mut(node) {
            element.checked = checked;
        }
    }

    fn text(&self, node: NodeId) -> Option<String> {
        self.get(node).map(|element| element.text.clone())
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(element) = self.get_mut(node) {
            element.text = text.to_string();
        }
    }

    fn focus(&mut self, node: NodeId) {
        if self.is_connected(node) {
            self.focused = Some(node);
        }
    }

    fn active_element(&self) -> Option<NodeId> {
        self.focused.filter(|node| self.is_connected(*node))
    }

    fn create_element(&mut self, parent: NodeId, tag: &str) -> Option<NodeId> {
        if !self.is_connected(parent) {
            return None;
        }
        Some(self.push(parent, tag))
    }

    fn remove(&mut self, node: NodeId) {
        if node == self.root() {
            return;
        }
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(parent) = self.get_mut(parent) {
            parent.children.retain(|child| *child != node);
        }
        if let Some(element) = self.get_mut(node) {
            element.parent = None;
        }
    }

    fn location_query(&self) -> Option<String> {
        self.query.clone()
    }
}

pub struct ElementBuilder<'a> {
    doc: &'a mut MemoryDocument,
    node: NodeId,
}

impl ElementBuilder<'_> {
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        for class in class.split_whitespace() {
            self.doc.add_class(self.node, class);
        }
        self
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.doc.set_attribute(self.node, name, value);
        self
    }

    pub fn value(self, value: &str) -> Self {
        self.doc.set_value(self.node, value);
        self
    }

    pub fn checked(self, checked: bool) -> Self {
        self.doc.set_checked(self.node, checked);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.doc.set_text(self.node, text);
        self
    }

    pub fn style(self, property: &str, value: &str) -> Self {
        self.doc.set_style(self.node, property, Some(value));
        self
    }

    pub fn build(self) -> NodeId {
        self.node
    }
}
