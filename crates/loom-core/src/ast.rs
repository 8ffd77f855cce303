//! The design document model.
//!
//! A `DesignDocument` owns a tree of `DesignNode`s. Parents own their children
//! exclusively, so the model is acyclic by construction; the parser is the only
//! place back-references can appear and it rejects them.

use crate::color::Color;
use crate::traverse::DepthFirst;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable node identifier as assigned by the design source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of visual element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Frames, groups, components and instances.
    Frame,
    Text,
    Image,
    /// Vector shapes (rectangles, ellipses, paths, ...).
    Vector,
}

impl NodeKind {
    /// Map a design-source kind name onto a node kind.
    ///
    /// Matching is case-insensitive so both `frame` and `FRAME` are accepted.
    pub fn from_source(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "frame" | "group" | "component" | "component_set" | "instance" | "section" => {
                NodeKind::Frame
            }
            "text" => NodeKind::Text,
            "image" => NodeKind::Image,
            "vector" | "rectangle" | "ellipse" | "line" | "star" | "polygon"
            | "boolean_operation" | "shape" => NodeKind::Vector,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether an image reference on a node of this kind is rendered.
    /// Text nodes render their characters only.
    pub fn renders_image(&self) -> bool {
        *self != NodeKind::Text
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Frame => "frame",
            NodeKind::Text => "text",
            NodeKind::Image => "image",
            NodeKind::Vector => "vector",
        }
    }
}

/// Axis-aligned bounding box in design-space units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge (x + width).
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (y + height).
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Length of the shared horizontal extent (zero when disjoint).
    pub fn horizontal_overlap(&self, other: &Bounds) -> f64 {
        (self.right().min(other.right()) - self.x.max(other.x)).max(0.0)
    }

    /// Length of the shared vertical extent (zero when disjoint).
    pub fn vertical_overlap(&self, other: &Bounds) -> f64 {
        (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0)
    }

    /// Area of the intersection with another box.
    pub fn intersection_area(&self, other: &Bounds) -> f64 {
        self.horizontal_overlap(other) * self.vertical_overlap(other)
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// Style attributes of a node. Absent attributes are `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
    pub corner_radius: Option<f64>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<u16>,
    pub opacity: Option<f64>,
}

/// Style attributes that are bound to the token vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleAttribute {
    Fill,
    Stroke,
    FontSize,
}

impl StyleAttribute {
    pub const ALL: [StyleAttribute; 3] =
        [StyleAttribute::Fill, StyleAttribute::Stroke, StyleAttribute::FontSize];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleAttribute::Fill => "fill",
            StyleAttribute::Stroke => "stroke",
            StyleAttribute::FontSize => "font-size",
        }
    }
}

impl fmt::Display for StyleAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a binary image payload held by the design source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Source reference (URL, path or `data:` URI).
    pub reference: String,
    /// A required image aborts the run when it cannot be fetched.
    pub required: bool,
}

/// One visual element of the design tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignNode {
    pub id: NodeId,
    pub name: Option<String>,
    pub kind: NodeKind,
    pub bounds: Bounds,
    pub style: Style,
    pub text: Option<String>,
    pub image: Option<ImageRef>,
    pub children: Vec<DesignNode>,
}

impl DesignNode {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, bounds: Bounds) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind,
            bounds,
            style: Style::default(),
            text: None,
            image: None,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: DesignNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_image(mut self, reference: impl Into<String>, required: bool) -> Self {
        self.image = Some(ImageRef { reference: reference.into(), required });
        self
    }

    /// Pre-order traversal rooted at this node.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst::new(self)
    }
}

/// A parsed, validated design document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    pub name: String,
    pub root: DesignNode,
}

impl DesignDocument {
    pub fn new(name: impl Into<String>, root: DesignNode) -> Self {
        Self { name: name.into(), root }
    }

    /// The traversal every pass uses: depth-first, children in source order.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        self.root.depth_first()
    }

    /// Find a node by identifier.
    pub fn find(&self, id: &NodeId) -> Option<&DesignNode> {
        self.depth_first().map(|visit| visit.node).find(|node| &node.id == id)
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.depth_first().count()
    }
}
