//! Raw design tree → validated `DesignDocument`.

use crate::ast::{Bounds, DesignDocument, DesignNode, ImageRef, NodeId, NodeKind, Style};
use crate::color::Color;
use crate::errors::ParseError;
use crate::raw::{RawChild, RawColor, RawDocument, RawGeometry, RawNode, RawStyle};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Deepest nesting accepted before the document is rejected.
pub const MAX_DEPTH: usize = 256;

const DEFAULT_NAME: &str = "Design";

/// Parse a JSON design tree.
pub fn parse_str(input: &str) -> Result<DesignDocument, ParseError> {
    let raw: RawDocument = serde_json::from_str(input)?;
    parse(&raw)
}

/// Validate a raw design tree and build the owned node tree.
pub fn parse(raw: &RawDocument) -> Result<DesignDocument, ParseError> {
    let mut parser = TreeParser::new(&raw.nodes);
    let root = parser.parse_child(&raw.root, "<document>", 0)?;

    let name = raw
        .name
        .clone()
        .or_else(|| root.name.clone())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    Ok(DesignDocument { name, root })
}

struct TreeParser<'a> {
    table: &'a IndexMap<String, RawNode>,
    /// Identifiers on the path from the root to the node being parsed.
    ancestors: Vec<String>,
    /// Every identifier accepted so far.
    seen: HashSet<String>,
}

impl<'a> TreeParser<'a> {
    fn new(table: &'a IndexMap<String, RawNode>) -> Self {
        Self {
            table,
            ancestors: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn parse_child(
        &mut self,
        slot: &'a RawChild,
        parent: &str,
        depth: usize,
    ) -> Result<DesignNode, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::MaxDepthExceeded { depth: MAX_DEPTH });
        }

        let (id, raw) = match slot {
            RawChild::Ref(reference) => {
                self.check_ancestors(reference)?;
                let raw = self.table.get(reference).ok_or_else(|| ParseError::UnknownReference {
                    parent: parent.to_string(),
                    reference: reference.clone(),
                })?;
                if let Some(declared) = raw.id.as_ref().filter(|declared| *declared != reference) {
                    return Err(ParseError::IdentifierMismatch {
                        node: NodeId(reference.clone()),
                        declared: declared.clone(),
                    });
                }
                (reference.clone(), raw)
            }
            RawChild::Inline(raw) => {
                let id = raw.id.clone().ok_or_else(|| ParseError::MissingIdentifier {
                    parent: parent.to_string(),
                })?;
                self.check_ancestors(&id)?;
                (id, raw.as_ref())
            }
        };

        if !self.seen.insert(id.clone()) {
            return Err(ParseError::DuplicateNode { node: NodeId(id) });
        }

        self.ancestors.push(id.clone());
        let node = self.parse_node(NodeId(id), raw, depth)?;
        self.ancestors.pop();

        Ok(node)
    }

    fn check_ancestors(&self, id: &str) -> Result<(), ParseError> {
        if let Some(position) = self.ancestors.iter().position(|ancestor| ancestor == id) {
            let mut path = self.ancestors[position..].to_vec();
            path.push(id.to_string());
            return Err(ParseError::Cycle { path });
        }
        Ok(())
    }

    fn parse_node(
        &mut self,
        id: NodeId,
        raw: &'a RawNode,
        depth: usize,
    ) -> Result<DesignNode, ParseError> {
        let kind_name = raw.kind.as_deref().unwrap_or("frame");
        let kind = NodeKind::from_source(kind_name).ok_or_else(|| ParseError::UnknownKind {
            node: id.clone(),
            kind: kind_name.to_string(),
        })?;

        let bounds = parse_geometry(&id, raw.geometry.as_ref())?;
        let style = parse_style(&id, &raw.style)?;

        let image = raw
            .image
            .as_ref()
            .and_then(|image| {
                image
                    .reference
                    .as_ref()
                    .filter(|reference| !reference.trim().is_empty())
                    .map(|reference| ImageRef {
                        reference: reference.clone(),
                        required: image.required,
                    })
            });
        if kind == NodeKind::Image && image.is_none() {
            return Err(ParseError::MissingImageReference { node: id });
        }

        let mut child_ids = HashSet::new();
        let mut children = Vec::with_capacity(raw.children.len());
        for slot in &raw.children {
            if let Some(child_id) = slot_id(slot) {
                if !child_ids.insert(child_id) {
                    return Err(ParseError::DuplicateChild {
                        parent: id,
                        child: NodeId(child_id.to_string()),
                    });
                }
            }
            children.push(self.parse_child(slot, id.as_str(), depth + 1)?);
        }

        Ok(DesignNode {
            id,
            name: raw.name.clone(),
            kind,
            bounds,
            style,
            text: raw.text.clone(),
            image,
            children,
        })
    }
}

fn slot_id(slot: &RawChild) -> Option<&str> {
    match slot {
        RawChild::Ref(reference) => Some(reference),
        RawChild::Inline(raw) => raw.id.as_deref(),
    }
}

fn parse_geometry(id: &NodeId, geometry: Option<&RawGeometry>) -> Result<Bounds, ParseError> {
    let geometry = geometry.ok_or_else(|| ParseError::MissingGeometry {
        node: id.clone(),
        field: "geometry",
    })?;

    let field = |field: &'static str, value: Option<f64>| -> Result<f64, ParseError> {
        let value = value.ok_or_else(|| ParseError::MissingGeometry { node: id.clone(), field })?;
        if !value.is_finite() || value < 0.0 {
            return Err(ParseError::InvalidGeometry { node: id.clone(), field, value });
        }
        Ok(value)
    };

    Ok(Bounds {
        x: field("x", geometry.x)?,
        y: field("y", geometry.y)?,
        width: field("width", geometry.width)?,
        height: field("height", geometry.height)?,
    })
}

fn parse_style(id: &NodeId, raw: &RawStyle) -> Result<Style, ParseError> {
    let length = |attribute: &'static str, value: Option<f64>| -> Result<Option<f64>, ParseError> {
        match value {
            Some(v) if !v.is_finite() || v < 0.0 => Err(ParseError::InvalidStyle {
                node: id.clone(),
                attribute,
                value: v,
            }),
            other => Ok(other),
        }
    };

    let opacity = match raw.opacity {
        Some(v) if !(0.0..=1.0).contains(&v) => {
            return Err(ParseError::InvalidStyle { node: id.clone(), attribute: "opacity", value: v });
        }
        other => other,
    };

    let font_weight = match raw.font_weight {
        Some(v) if !v.is_finite() || !(1.0..=1000.0).contains(&v) => {
            return Err(ParseError::InvalidStyle {
                node: id.clone(),
                attribute: "font-weight",
                value: v,
            });
        }
        Some(v) => Some(v.round() as u16),
        None => None,
    };

    Ok(Style {
        fill: parse_color(id, "fill", raw.fill.as_ref())?,
        stroke: parse_color(id, "stroke", raw.stroke.as_ref())?,
        stroke_width: length("stroke-width", raw.stroke_width)?,
        corner_radius: length("corner-radius", raw.corner_radius)?,
        font_family: raw.font_family.clone(),
        font_size: length("font-size", raw.font_size)?,
        font_weight,
        opacity,
    })
}

fn parse_color(
    id: &NodeId,
    attribute: &'static str,
    raw: Option<&RawColor>,
) -> Result<Option<Color>, ParseError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let (color, text) = match raw {
        RawColor::Literal(text) => (Color::parse(text), text.clone()),
        RawColor::Channels { r, g, b, a } => {
            (Color::from_unit(*r, *g, *b, *a), format!("rgba({r}, {g}, {b}, {a})"))
        }
    };

    color.map(Some).ok_or_else(|| ParseError::InvalidColor {
        node: id.clone(),
        attribute,
        value: text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(x: f64, y: f64, w: f64, h: f64) -> serde_json::Value {
        serde_json::json!({ "x": x, "y": y, "width": w, "height": h })
    }

    #[test]
    fn test_parse_inline_tree() {
        let input = serde_json::json!({
            "name": "Card",
            "root": {
                "id": "1:1",
                "kind": "FRAME",
                "geometry": geometry(0.0, 0.0, 320.0, 200.0),
                "style": { "fill": "#ffffff", "cornerRadius": 8 },
                "children": [
                    { "id": "1:2", "type": "TEXT", "characters": "Hello",
                      "absoluteBoundingBox": geometry(16.0, 16.0, 100.0, 20.0),
                      "style": { "fill": { "r": 0.0, "g": 0.0, "b": 0.0 }, "fontSize": 14, "fontWeight": 600 } },
                    { "id": "1:3", "kind": "image",
                      "geometry": geometry(16.0, 48.0, 64.0, 64.0),
                      "image": { "ref": "https://cdn.example/a.png", "required": true } }
                ]
            }
        });

        let doc = parse_str(&input.to_string()).unwrap();
        assert_eq!(doc.name, "Card");
        assert_eq!(doc.root.children.len(), 2);

        let text = &doc.root.children[0];
        assert_eq!(text.kind, NodeKind::Text);
        assert_eq!(text.text.as_deref(), Some("Hello"));
        assert_eq!(text.style.fill, Some(Color::rgb(0, 0, 0)));
        assert_eq!(text.style.font_weight, Some(600));

        let image = doc.root.children[1].image.as_ref().unwrap();
        assert_eq!(image.reference, "https://cdn.example/a.png");
        assert!(image.required);
    }

    #[test]
    fn test_parse_references() {
        let input = serde_json::json!({
            "root": "root",
            "nodes": {
                "root": { "kind": "frame", "geometry": geometry(0.0, 0.0, 100.0, 100.0), "children": ["a", "b"] },
                "a": { "kind": "vector", "geometry": geometry(0.0, 0.0, 10.0, 10.0) },
                "b": { "kind": "vector", "geometry": geometry(20.0, 0.0, 10.0, 10.0) }
            }
        });

        let doc = parse_str(&input.to_string()).unwrap();
        assert_eq!(doc.name, "Design");
        let ids: Vec<_> = doc.depth_first().map(|v| v.node.id.0.clone()).collect();
        assert_eq!(ids, vec!["root", "a", "b"]);
    }

    #[test]
    fn test_cycle_rejected() {
        let input = serde_json::json!({
            "root": "root",
            "nodes": {
                "root": { "geometry": geometry(0.0, 0.0, 100.0, 100.0), "children": ["a"] },
                "a": { "geometry": geometry(0.0, 0.0, 10.0, 10.0), "children": ["root"] }
            }
        });

        match parse_str(&input.to_string()) {
            Err(ParseError::Cycle { path }) => assert_eq!(path, vec!["root", "a", "root"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_rejected() {
        let input = serde_json::json!({
            "root": "a",
            "nodes": { "a": { "geometry": geometry(0.0, 0.0, 1.0, 1.0), "children": ["a"] } }
        });
        assert!(matches!(parse_str(&input.to_string()), Err(ParseError::Cycle { .. })));
    }

    #[test]
    fn test_missing_geometry_rejected() {
        let input = serde_json::json!({
            "root": { "id": "r", "geometry": { "x": 0, "y": 0, "width": 10 } }
        });
        assert!(matches!(
            parse_str(&input.to_string()),
            Err(ParseError::MissingGeometry { field: "height", .. })
        ));

        let input = serde_json::json!({ "root": { "id": "r" } });
        assert!(matches!(
            parse_str(&input.to_string()),
            Err(ParseError::MissingGeometry { field: "geometry", .. })
        ));
    }

    #[test]
    fn test_negative_geometry_rejected() {
        let input = serde_json::json!({
            "root": { "id": "r", "geometry": geometry(0.0, 0.0, -5.0, 10.0) }
        });
        assert!(matches!(
            parse_str(&input.to_string()),
            Err(ParseError::InvalidGeometry { field: "width", .. })
        ));
    }

    #[test]
    fn test_duplicate_child_rejected() {
        let input = serde_json::json!({
            "root": "root",
            "nodes": {
                "root": { "geometry": geometry(0.0, 0.0, 100.0, 100.0), "children": ["a", "a"] },
                "a": { "geometry": geometry(0.0, 0.0, 10.0, 10.0) }
            }
        });
        assert!(matches!(parse_str(&input.to_string()), Err(ParseError::DuplicateChild { .. })));
    }

    #[test]
    fn test_duplicate_node_across_parents_rejected() {
        let input = serde_json::json!({
            "root": {
                "id": "r", "geometry": geometry(0.0, 0.0, 100.0, 100.0),
                "children": [
                    { "id": "p", "geometry": geometry(0.0, 0.0, 10.0, 10.0),
                      "children": [{ "id": "x", "geometry": geometry(0.0, 0.0, 1.0, 1.0) }] },
                    { "id": "x", "geometry": geometry(50.0, 0.0, 1.0, 1.0) }
                ]
            }
        });
        assert!(matches!(parse_str(&input.to_string()), Err(ParseError::DuplicateNode { .. })));
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let input = serde_json::json!({
            "root": { "id": "r", "geometry": geometry(0.0, 0.0, 1.0, 1.0), "children": ["ghost"] }
        });
        assert!(matches!(parse_str(&input.to_string()), Err(ParseError::UnknownReference { .. })));
    }

    #[test]
    fn test_invalid_color_rejected() {
        let input = serde_json::json!({
            "root": { "id": "r", "geometry": geometry(0.0, 0.0, 1.0, 1.0), "style": { "fill": "blurple" } }
        });
        assert!(matches!(
            parse_str(&input.to_string()),
            Err(ParseError::InvalidColor { attribute: "fill", .. })
        ));
    }

    #[test]
    fn test_image_without_reference_rejected() {
        let input = serde_json::json!({
            "root": { "id": "r", "kind": "image", "geometry": geometry(0.0, 0.0, 1.0, 1.0) }
        });
        assert!(matches!(
            parse_str(&input.to_string()),
            Err(ParseError::MissingImageReference { .. })
        ));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let input = serde_json::json!({
            "root": { "id": "r", "kind": "sticker", "geometry": geometry(0.0, 0.0, 1.0, 1.0) }
        });
        assert!(matches!(parse_str(&input.to_string()), Err(ParseError::UnknownKind { .. })));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(parse_str("{ not json"), Err(ParseError::Json(_))));
    }
}
