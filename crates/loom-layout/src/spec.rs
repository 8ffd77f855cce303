//! Inferred layout of a node.

use glam::DVec2;
use indexmap::IndexMap;
use loom_core::{NodeId, ResponsiveLength, Viewport};
use serde::Serialize;

/// Main axis of a flex container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    #[default]
    Column,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Column => "column",
        }
    }
}

/// Cross-axis alignment of a node within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Start,
    Center,
    End,
    #[default]
    Stretch,
}

impl Alignment {
    /// CSS `align-self` value.
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Start => "flex-start",
            Alignment::Center => "center",
            Alignment::End => "flex-end",
            Alignment::Stretch => "stretch",
        }
    }
}

/// A spacing value snapped to the spacing scale.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    #[default]
    Zero,
    Step {
        /// Custom property name, e.g. `space-16`.
        token: String,
        /// The step in design units.
        step: f64,
    },
}

impl Spacing {
    pub fn is_zero(&self) -> bool {
        matches!(self, Spacing::Zero)
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Spacing::Zero => None,
            Spacing::Step { token, .. } => Some(token),
        }
    }
}

/// Padding of a container, one snapped value per side.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Padding {
    pub top: Spacing,
    pub right: Spacing,
    pub bottom: Spacing,
    pub left: Spacing,
}

impl Padding {
    pub fn is_zero(&self) -> bool {
        self.sides().iter().all(|side| side.is_zero())
    }

    /// Sides in CSS shorthand order.
    pub fn sides(&self) -> [&Spacing; 4] {
        [&self.top, &self.right, &self.bottom, &self.left]
    }
}

/// A two-dimensional offset in responsive units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Offset {
    pub x: ResponsiveLength,
    pub y: ResponsiveLength,
}

impl Offset {
    pub fn from_design(delta: DVec2, viewport: &Viewport) -> Self {
        Self {
            x: viewport.to_responsive(delta.x),
            y: viewport.to_responsive(delta.y),
        }
    }
}

/// How a node is placed within its parent.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Positioning {
    #[default]
    Flow,
    /// Absolutely placed relative to a flow-positioned sibling.
    Overlay {
        anchor: NodeId,
        /// Offset from the anchor's origin.
        offset: Offset,
        /// The anchor's origin relative to the parent.
        origin: Offset,
    },
}

impl Positioning {
    pub fn anchor(&self) -> Option<&NodeId> {
        match self {
            Positioning::Flow => None,
            Positioning::Overlay { anchor, .. } => Some(anchor),
        }
    }
}

/// Rendered size of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: ResponsiveLength,
    pub height: ResponsiveLength,
}

/// Everything the emitter needs to lay a node out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSpec {
    /// Axis of this node's flow children.
    pub axis: Axis,
    /// Alignment of this node within its parent.
    pub alignment: Alignment,
    /// Uniform gap between this node's flow children.
    pub gap: Spacing,
    /// Leading space before this node when its parent's gaps are irregular.
    pub spacing_before: Option<Spacing>,
    pub padding: Padding,
    pub positioning: Positioning,
    pub size: Size,
}

impl LayoutSpec {
    pub fn is_overlay(&self) -> bool {
        matches!(self.positioning, Positioning::Overlay { .. })
    }
}

/// Layout specs of every node, in traversal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutMap {
    specs: IndexMap<NodeId, LayoutSpec>,
}

impl LayoutMap {
    pub fn get(&self, node: &NodeId) -> Option<&LayoutSpec> {
        self.specs.get(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &LayoutSpec)> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Overlay nodes with their anchors.
    pub fn overlays(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> {
        self.specs
            .iter()
            .filter_map(|(id, spec)| spec.positioning.anchor().map(|anchor| (id, anchor)))
    }

    pub(crate) fn insert(&mut self, node: NodeId, spec: LayoutSpec) {
        self.specs.insert(node, spec);
    }
}
