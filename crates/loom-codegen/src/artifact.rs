use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of generated file. Every run produces exactly one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Component,
    Style,
    Manifest,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Component, ArtifactKind::Style, ArtifactKind::Manifest];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Component => "component",
            ArtifactKind::Style => "style",
            ArtifactKind::Manifest => "manifest",
        }
    }

    /// File name suffix appended to the component name.
    pub fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Component => ".tsx",
            ArtifactKind::Style => ".module.css",
            ArtifactKind::Manifest => ".assets.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub kind: ArtifactKind,
    /// File name relative to the output directory.
    pub file_name: String,
    pub content: String,
}

impl GeneratedArtifact {
    pub fn new(kind: ArtifactKind, component: &str, content: String) -> Self {
        Self {
            kind,
            file_name: format!("{component}{}", kind.suffix()),
            content,
        }
    }
}

/// Options for emission.
#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    /// Component name; defaults to the document name.
    pub component_name: Option<String>,
}
