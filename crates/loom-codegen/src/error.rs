//! Error types for code generation.

use loom_core::NodeId;
use thiserror::Error;

/// Result type alias for codegen operations.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur during code generation.
#[derive(Error, Debug)]
pub enum CodegenError {
    /// A node has no inferred layout.
    #[error("No layout spec for node '{0}'")]
    MissingLayout(NodeId),

    /// An image node has no asset record.
    #[error("No asset record for image node '{0}'")]
    MissingAsset(NodeId),

    /// Template rendering error.
    #[error("Template error: {0}")]
    TemplateError(#[from] handlebars::RenderError),

    /// Invalid template.
    #[error("Invalid template: {0}")]
    InvalidTemplate(#[from] handlebars::TemplateError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
