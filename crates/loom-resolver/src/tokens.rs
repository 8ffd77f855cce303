//! Token resolution.
//!
//! Resolves literal colors and font sizes to their vocabulary tokens.

use crate::binding::{NodeBindings, Resolution, TokenBinding, TokenBindings, TokenRef, Value};
use loom_core::{
    nearest_by, nearest_step, Color, DesignDocument, DesignNode, StyleAttribute, TieBreak,
    TokenKind, TokenVocabulary,
};
use rayon::prelude::*;
use tracing::debug;

/// Resolve the token-bound attributes of a single node.
pub fn resolve(node: &DesignNode, vocab: &TokenVocabulary) -> NodeBindings {
    TokenResolver::new(vocab).resolve_node(node)
}

/// Resolve every node of a document.
///
/// Nodes are resolved in parallel; the result keeps traversal order.
pub fn resolve_tree(doc: &DesignDocument, vocab: &TokenVocabulary) -> TokenBindings {
    let resolver = TokenResolver::new(vocab);
    let nodes: Vec<&DesignNode> = doc.depth_first().map(|visit| visit.node).collect();

    let bindings: TokenBindings = nodes
        .par_iter()
        .map(|node| (node.id.clone(), resolver.resolve_node(node)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    debug!(
        nodes = nodes.len(),
        unresolved = bindings.unresolved().count(),
        "resolved design tokens"
    );
    bindings
}

/// Matches literal values against a token vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct TokenResolver<'a> {
    vocab: &'a TokenVocabulary,
}

impl<'a> TokenResolver<'a> {
    pub fn new(vocab: &'a TokenVocabulary) -> Self {
        Self { vocab }
    }

    pub fn resolve_node(&self, node: &DesignNode) -> NodeBindings {
        let mut bindings = NodeBindings::new();

        for attribute in StyleAttribute::ALL {
            let binding = match attribute {
                StyleAttribute::Fill => node.style.fill.map(|c| self.bind_color(attribute, c)),
                StyleAttribute::Stroke => node.style.stroke.map(|c| self.bind_color(attribute, c)),
                StyleAttribute::FontSize => node.style.font_size.map(|s| self.bind_font_size(s)),
            };
            if let Some(binding) = binding {
                bindings.insert(attribute, binding);
            }
        }

        bindings
    }

    /// Exact palette match first, then the nearest entry within the color
    /// threshold. Equal distances go to the entry declared first.
    pub fn resolve_color(&self, color: Color) -> Option<TokenRef> {
        let palette = &self.vocab.palette;

        let entry = match palette.iter().find(|entry| entry.color == color) {
            Some(entry) => entry,
            None => {
                nearest_by(
                    palette,
                    |entry| entry.color.distance(&color),
                    TieBreak::Lower,
                    Some(self.vocab.color_threshold),
                )?
                .value
            }
        };

        Some(TokenRef {
            name: entry.token_name(),
            kind: TokenKind::Color,
            value: Value::Color(entry.color),
            exact: entry.color == color,
        })
    }

    /// Snap a font size to the nearest font step.
    pub fn resolve_font_size(&self, size: f64) -> Option<TokenRef> {
        let step = *nearest_step(&self.vocab.font_steps, size)?.value;
        Some(TokenRef {
            name: TokenVocabulary::font_token(step),
            kind: TokenKind::FontSize,
            value: Value::Length(step),
            exact: step == size,
        })
    }

    fn bind_color(&self, attribute: StyleAttribute, color: Color) -> TokenBinding {
        TokenBinding {
            attribute,
            raw: Value::Color(color),
            resolution: self.resolve_color(color).map_or(Resolution::Unresolved, Resolution::Token),
        }
    }

    fn bind_font_size(&self, size: f64) -> TokenBinding {
        TokenBinding {
            attribute: StyleAttribute::FontSize,
            raw: Value::Length(size),
            resolution: self.resolve_font_size(size).map_or(Resolution::Unresolved, Resolution::Token),
        }
    }
}
