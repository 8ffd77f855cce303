use crate::source::DesignSource;
use loom_assets::ImageSource;
use loom_core::SourceError;
use std::collections::HashMap;

/// A design source backed by in-memory maps.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    trees: HashMap<String, String>,
    images: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree(mut self, reference: impl Into<String>, json: impl Into<String>) -> Self {
        self.trees.insert(reference.into(), json.into());
        self
    }

    pub fn with_image(mut self, reference: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.images.insert(reference.into(), bytes.into());
        self
    }
}

impl ImageSource for MemorySource {
    async fn fetch_image_bytes(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(reference.to_string()))
    }
}

impl DesignSource for MemorySource {
    async fn fetch_design_tree(&self, reference: &str) -> Result<String, SourceError> {
        self.trees
            .get(reference)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(reference.to_string()))
    }
}
