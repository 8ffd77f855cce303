//! Raw design-tree format as supplied by a design source.
//!
//! Children are either inline nodes or string references into the document's
//! `nodes` table. References are what make shared or cyclic structures
//! expressible in the input; the parser resolves them and rejects cycles.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A raw design document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(default)]
    pub name: Option<String>,
    /// The root node, inline or by reference.
    pub root: RawChild,
    /// Nodes addressable by reference, keyed by identifier.
    #[serde(default)]
    pub nodes: IndexMap<String, RawNode>,
}

/// A child slot: an inline node or the identifier of a node in the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawChild {
    Ref(String),
    Inline(Box<RawNode>),
}

impl Default for RawChild {
    fn default() -> Self {
        RawChild::Inline(Box::default())
    }
}

/// A raw node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "absoluteBoundingBox")]
    pub geometry: Option<RawGeometry>,
    #[serde(default)]
    pub style: RawStyle,
    #[serde(default, alias = "characters")]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<RawImage>,
    #[serde(default)]
    pub children: Vec<RawChild>,
}

/// Raw geometry; every field is checked by the parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGeometry {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Raw style attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStyle {
    #[serde(default)]
    pub fill: Option<RawColor>,
    #[serde(default)]
    pub stroke: Option<RawColor>,
    #[serde(default)]
    pub stroke_width: Option<f64>,
    #[serde(default)]
    pub corner_radius: Option<f64>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_weight: Option<f64>,
    #[serde(default)]
    pub opacity: Option<f64>,
}

/// A color as a literal string or as unit channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawColor {
    Literal(String),
    Channels {
        r: f64,
        g: f64,
        b: f64,
        #[serde(default = "opaque")]
        a: f64,
    },
}

fn opaque() -> f64 {
    1.0
}

/// Raw image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImage {
    #[serde(alias = "ref", alias = "imageRef", alias = "url")]
    pub reference: Option<String>,
    #[serde(default)]
    pub required: bool,
}
