use loom_core::NodeId;
use serde::Serialize;
use std::fmt;

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    MissingArtifact,
    MalformedManifest,
    MalformedStyleHeader,
    UnknownStyleNode,
    MissingAnchor,
    UnknownAnchor,
    NestedOverlay,
    AnchorMismatch,
    ConflictingAsset,
    UnknownManifestNode,
    UndeclaredToken,
    UnknownImageSource,
    UnresolvedToken,
    PlaceholderAsset,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::MissingArtifact => "missing-artifact",
            DiagnosticCode::MalformedManifest => "malformed-manifest",
            DiagnosticCode::MalformedStyleHeader => "malformed-style-header",
            DiagnosticCode::UnknownStyleNode => "unknown-style-node",
            DiagnosticCode::MissingAnchor => "missing-anchor",
            DiagnosticCode::UnknownAnchor => "unknown-anchor",
            DiagnosticCode::NestedOverlay => "nested-overlay",
            DiagnosticCode::AnchorMismatch => "anchor-mismatch",
            DiagnosticCode::ConflictingAsset => "conflicting-asset",
            DiagnosticCode::UnknownManifestNode => "unknown-manifest-node",
            DiagnosticCode::UndeclaredToken => "undeclared-token",
            DiagnosticCode::UnknownImageSource => "unknown-image-source",
            DiagnosticCode::UnresolvedToken => "unresolved-token",
            DiagnosticCode::PlaceholderAsset => "placeholder-asset",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, node: Option<NodeId>, message: impl Into<String>) -> Self {
        Self { code, node, message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "[{}] {}: {}", self.code, node, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Outcome of validating a set of artifacts.
///
/// A report with any error rejects the run; warnings are informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Report {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&mut self, code: DiagnosticCode, node: Option<&NodeId>, message: impl Into<String>) {
        self.errors.push(Diagnostic::new(code, node.cloned(), message));
    }

    pub fn warn(&mut self, code: DiagnosticCode, node: Option<&NodeId>, message: impl Into<String>) {
        self.warnings.push(Diagnostic::new(code, node.cloned(), message));
    }

    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.errors.first()
    }
}
