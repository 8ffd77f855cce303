//! Error types for the Loom engine.

use crate::ast::NodeId;
use thiserror::Error;

/// Top-level error type for a generation run.
#[derive(Debug, Error)]
pub enum LoomError {
    #[error("malformed design document: {0}")]
    MalformedDocument(#[from] ParseError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("layout invariant violated: {0}")]
    LayoutInvariantViolation(#[from] LayoutError),

    #[error("asset fetch failed: {0}")]
    AssetFetchError(#[from] AssetError),

    #[error("design source failed: {0}")]
    Source(#[from] SourceError),

    #[error("emission failed: {message}")]
    Emission { message: String },

    #[error("emitted artifacts are inconsistent: {message}")]
    EmissionMismatch { message: String },

    #[error("failed to write artifacts: {0}")]
    Io(#[from] std::io::Error),

    #[error("run was cancelled")]
    Cancelled,

    #[error("background task failed: {0}")]
    Task(String),
}

/// Errors while parsing a raw design tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node without identifier under {parent}")]
    MissingIdentifier { parent: String },

    #[error("node {node} has identifier {declared} in its body")]
    IdentifierMismatch { node: NodeId, declared: String },

    #[error("node {node} is missing geometry field '{field}'")]
    MissingGeometry { node: NodeId, field: &'static str },

    #[error("node {node} has invalid geometry {field} = {value}")]
    InvalidGeometry { node: NodeId, field: &'static str, value: f64 },

    #[error("node {parent} lists child {child} more than once")]
    DuplicateChild { parent: NodeId, child: NodeId },

    #[error("identifier {node} appears more than once in the tree")]
    DuplicateNode { node: NodeId },

    #[error("cycle detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("node {parent} references unknown node {reference}")]
    UnknownReference { parent: String, reference: String },

    #[error("node {node} has unknown kind '{kind}'")]
    UnknownKind { node: NodeId, kind: String },

    #[error("node {node} has invalid {attribute} color '{value}'")]
    InvalidColor { node: NodeId, attribute: &'static str, value: String },

    #[error("node {node} has invalid {attribute} value {value}")]
    InvalidStyle { node: NodeId, attribute: &'static str, value: f64 },

    #[error("image node {node} has no image reference")]
    MissingImageReference { node: NodeId },

    #[error("maximum nesting depth ({depth}) exceeded")]
    MaxDepthExceeded { depth: usize },
}

/// Errors in the token vocabulary or engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    EmptySteps { field: &'static str },

    #[error("{field} must be finite, non-negative and strictly ascending (offending value {value})")]
    UnorderedSteps { field: &'static str, value: f64 },

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("palette entry '{name}' has invalid color '{value}'")]
    InvalidPaletteColor { name: String, value: String },

    #[error("palette entry name '{name}' must match [a-z0-9-]+")]
    InvalidTokenName { name: String },

    #[error("failed to load configuration from {path}: {reason}")]
    Load { path: String, reason: String },
}

/// Errors during layout inference. These indicate an engine bug or geometry
/// the engine cannot express.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("overlay node {node} has no flow-positioned anchor")]
    MissingAnchor { node: NodeId },

    #[error("node {node} is not a child of {parent}")]
    NotASibling { node: NodeId, parent: NodeId },

    #[error("no layout was inferred for node {node}")]
    MissingSpec { node: NodeId },
}

/// Errors from the asset pipeline that abort the run.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("required image {reference} for {} unavailable after {attempts} attempt(s): {reason}", format_nodes(.nodes))]
    RequiredUnavailable {
        reference: String,
        nodes: Vec<NodeId>,
        attempts: u32,
        reason: String,
    },

    #[error("asset cache I/O error at {path}: {source}")]
    Cache {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by a design source while fetching data.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported reference: {0}")]
    Unsupported(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_nodes(nodes: &[NodeId]) -> String {
    nodes.iter().map(NodeId::as_str).collect::<Vec<_>>().join(", ")
}
