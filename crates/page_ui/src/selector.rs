//! The small selector dialect used by registration tables and page markers:
//! compound selectors (`tag#id.class[attr=value]`) joined by commas.
//! Combinators are not supported.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::dom::{Document, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected '{found}' at offset {offset} in selector '{source_text}'")]
    Unexpected {
        found: char,
        offset: usize,
        source_text: String,
    },
    #[error("unterminated attribute in selector '{0}'")]
    UnterminatedAttribute(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            if doc.tag(node).as_deref() != Some(tag.as_str()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.attribute(node, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| doc.has_class(node, class)) {
            return false;
        }
        self.attributes
            .iter()
            .all(|(name, expected)| match (doc.attribute(node, name), expected) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == *expected,
                (None, _) => false,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
    source: String,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for part in split_alternatives(source) {
            alternatives.push(parse_compound(part.trim(), source)?);
        }
        Ok(Self {
            alternatives,
            source: source.trim().to_string(),
        })
    }

    pub fn id(id: &str) -> Self {
        Self::single(
            Compound {
                id: Some(id.to_string()),
                ..Compound::default()
            },
            format!("#{id}"),
        )
    }

    pub fn class(class: &str) -> Self {
        Self::single(
            Compound {
                classes: vec![class.to_string()],
                ..Compound::default()
            },
            format!(".{class}"),
        )
    }

    pub fn has_attr(name: &str) -> Self {
        Self::single(
            Compound {
                attributes: vec![(name.to_string(), None)],
                ..Compound::default()
            },
            format!("[{name}]"),
        )
    }

    pub fn attr_eq(name: &str, value: &str) -> Self {
        Self::single(
            Compound {
                attributes: vec![(name.to_string(), Some(value.to_string()))],
                ..Compound::default()
            },
            format!("[{name}=\"{value}\"]"),
        )
    }

    fn single(compound: Compound, source: String) -> Self {
        Self {
            alternatives: vec![compound],
            source,
        }
    }

    pub fn matches<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|compound| compound.matches(doc, node))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Splits at commas outside `[...]` and quotes.
fn split_alternatives(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;
    let mut quote: Option<char> = None;
    for (offset, c) in source.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if in_brackets => quote = Some(c),
            (None, '[') => in_brackets = true,
            (None, ']') => in_brackets = false,
            (None, ',') if !in_brackets => {
                parts.push(&source[start..offset]);
                start = offset + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

fn parse_compound(part: &str, source: &str) -> Result<Compound, SelectorError> {
    if part.is_empty() {
        return Err(SelectorError::Empty);
    }

    let unexpected = |found: char, offset: usize| SelectorError::Unexpected {
        found,
        offset,
        source_text: source.to_string(),
    };

    let mut compound = Compound::default();
    let chars: Vec<(usize, char)> = part.char_indices().collect();

    let read_ident = |start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len() && is_ident_char(chars[end].1) {
            end += 1;
        }
        (chars[start..end].iter().map(|(_, c)| c).collect(), end)
    };

    let (tag, next) = read_ident(0);
    if !tag.is_empty() {
        compound.tag = Some(tag.to_ascii_lowercase());
    }
    let mut i = next;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            '#' | '.' => {
                let (name, next) = read_ident(i + 1);
                if name.is_empty() {
                    return Err(unexpected(c, offset));
                }
                if c == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.push(name);
                }
                i = next;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|(_, c)| *c == ']')
                    .map(|pos| i + pos)
                    .ok_or_else(|| SelectorError::UnterminatedAttribute(source.to_string()))?;
                let inner: String = chars[i + 1..close].iter().map(|(_, c)| c).collect();
                let attribute = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim();
                        let value = value
                            .strip_prefix('"')
                            .and_then(|v| v.strip_suffix('"'))
                            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                            .unwrap_or(value);
                        (name.trim().to_string(), Some(value.to_string()))
                    }
                    None => (inner.trim().to_string(), None),
                };
                if attribute.0.is_empty() || !attribute.0.chars().all(is_ident_char) {
                    return Err(unexpected('[', offset));
                }
                compound.attributes.push(attribute);
                i = close + 1;
            }
            other => return Err(unexpected(other, offset)),
        }
    }

    Ok(compound)
}

#[cfg(test)]
#[path = "tests/selector_tests.rs"]
mod tests;
