//! Token bindings produced by the resolver.

use indexmap::IndexMap;
use loom_core::{Color, NodeId, StyleAttribute, TokenKind};
use serde::Serialize;
use std::fmt;

/// A literal style value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Value {
    Color(Color),
    /// A length in design units.
    Length(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Color(color) => f.write_str(&color.to_hex()),
            Value::Length(length) => {
                let text = format!("{length:.4}");
                write!(f, "{}", text.trim_end_matches('0').trim_end_matches('.'))
            }
        }
    }
}

/// A named token from the vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenRef {
    /// Custom property name without the leading `--`.
    pub name: String,
    pub kind: TokenKind,
    /// The token's own value.
    pub value: Value,
    /// Whether the raw value equals the token value.
    pub exact: bool,
}

/// Outcome of binding one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Token(TokenRef),
    Unresolved,
}

/// A style attribute bound (or not) to a token. The raw value is always kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenBinding {
    pub attribute: StyleAttribute,
    pub raw: Value,
    pub resolution: Resolution,
}

impl TokenBinding {
    pub fn token(&self) -> Option<&TokenRef> {
        match &self.resolution {
            Resolution::Token(token) => Some(token),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Token(_))
    }
}

/// Bindings of one node, keyed by attribute.
pub type NodeBindings = IndexMap<StyleAttribute, TokenBinding>;

/// Bindings of every node in a document, in traversal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenBindings {
    nodes: IndexMap<NodeId, NodeBindings>,
}

impl TokenBindings {
    pub fn insert(&mut self, node: NodeId, bindings: NodeBindings) {
        self.nodes.insert(node, bindings);
    }

    pub fn get(&self, node: &NodeId) -> Option<&NodeBindings> {
        self.nodes.get(node)
    }

    pub fn binding(&self, node: &NodeId, attribute: StyleAttribute) -> Option<&TokenBinding> {
        self.nodes.get(node).and_then(|bindings| bindings.get(&attribute))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeBindings)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every unresolved binding, in traversal order.
    pub fn unresolved(&self) -> impl Iterator<Item = (&NodeId, &TokenBinding)> {
        self.nodes.iter().flat_map(|(id, bindings)| {
            bindings.values().filter(|b| !b.is_resolved()).map(move |b| (id, b))
        })
    }
}

impl FromIterator<(NodeId, NodeBindings)> for TokenBindings {
    fn from_iter<I: IntoIterator<Item = (NodeId, NodeBindings)>>(iter: I) -> Self {
        Self { nodes: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Color(Color::rgb(255, 85, 0)).to_string(), "#ff5500");
        assert_eq!(Value::Length(14.0).to_string(), "14");
        assert_eq!(Value::Length(13.25).to_string(), "13.25");
    }
}
