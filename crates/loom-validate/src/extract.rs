//! Facts recovered from artifact text.

use loom_codegen::escape::{comment_unescape, html_attr_unescape, read_comment_json};
use loom_core::NodeId;
use regex::Regex;
use std::collections::BTreeSet;

/// Compiled extraction patterns.
pub(crate) struct Patterns {
    element: Regex,
    data_node: Regex,
    data_anchor: Regex,
    src: Regex,
    rule: Regex,
    root: Regex,
    declaration: Regex,
    var: Regex,
    unresolved: Regex,
}

impl Patterns {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            element: Regex::new(r"<(?:div|p|img)\b([^>]*)>")?,
            data_node: Regex::new(r#"\bdata-node="([^"]*)""#)?,
            data_anchor: Regex::new(r#"\bdata-anchor="([^"]*)""#)?,
            src: Regex::new(r#"\bsrc="([^"]*)""#)?,
            rule: Regex::new(r"(?ms)^/\* node: (.*?) \*/\n\.([A-Za-z0-9_-]+) \{\n(.*?)^\}")?,
            root: Regex::new(r"(?ms)^:root \{\n(.*?)^\}")?,
            declaration: Regex::new(r"(?m)^\s*--([A-Za-z0-9_-]+)\s*:")?,
            var: Regex::new(r"var\(--([A-Za-z0-9_-]+)\)")?,
            unresolved: Regex::new(r"/\* UNRESOLVED (\S+) (.*?) \*/")?,
        })
    }
}

/// One JSX element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub node: Option<NodeId>,
    pub anchor: Option<NodeId>,
    pub src: Option<String>,
}

/// One style rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StyleRule {
    pub node: NodeId,
    pub anchor: Option<NodeId>,
    pub class: String,
    pub absolute: bool,
    pub vars: Vec<String>,
    /// `(attribute, raw value)` of every unresolved marker.
    pub unresolved: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub(crate) struct StyleSheet {
    pub declared: BTreeSet<String>,
    pub rules: Vec<StyleRule>,
    /// Classes of rules whose `node:` header could not be read.
    pub malformed: Vec<String>,
}

/// Node and optional anchor of a rule header: `"id"` or `"id" anchor: "id"`.
fn rule_header(header: &str) -> Option<(NodeId, Option<NodeId>)> {
    let (node, rest) = read_comment_json(header)?;
    let anchor = match rest.strip_prefix(" anchor: ") {
        None if rest.is_empty() => None,
        None => return None,
        Some(anchor) => match read_comment_json(anchor)? {
            (anchor, "") => Some(NodeId::from(anchor)),
            _ => return None,
        },
    };
    Some((NodeId::from(node), anchor))
}

pub(crate) fn elements(patterns: &Patterns, tsx: &str) -> Vec<Element> {
    patterns
        .element
        .captures_iter(tsx)
        .map(|caps| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let attr = |re: &Regex| {
                re.captures(attrs)
                    .and_then(|c| c.get(1))
                    .map(|m| html_attr_unescape(m.as_str()))
            };
            Element {
                node: attr(&patterns.data_node).map(NodeId::from),
                anchor: attr(&patterns.data_anchor).map(NodeId::from),
                src: attr(&patterns.src),
            }
        })
        .collect()
}

pub(crate) fn style_sheet(patterns: &Patterns, css: &str) -> StyleSheet {
    let mut sheet = StyleSheet::default();

    if let Some(root) = patterns.root.captures(css).and_then(|c| c.get(1)) {
        sheet.declared = patterns
            .declaration
            .captures_iter(root.as_str())
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect();
    }

    for caps in patterns.rule.captures_iter(css) {
        let header = caps.get(1).map_or("", |m| m.as_str());
        let class = caps.get(2).map_or("", |m| m.as_str());
        let body = caps.get(3).map_or("", |m| m.as_str());

        let Some((node, anchor)) = rule_header(header) else {
            sheet.malformed.push(class.to_string());
            continue;
        };

        sheet.rules.push(StyleRule {
            node,
            anchor,
            class: class.to_string(),
            absolute: body.lines().any(|line| line.trim() == "position: absolute;"),
            vars: patterns
                .var
                .captures_iter(body)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .collect(),
            unresolved: patterns
                .unresolved
                .captures_iter(body)
                .map(|c| {
                    let attribute = c.get(1).map_or("", |m| m.as_str()).to_string();
                    let raw = c.get(2).map_or("", |m| m.as_str());
                    (attribute, comment_unescape(raw))
                })
                .collect(),
        });
    }

    sheet
}
