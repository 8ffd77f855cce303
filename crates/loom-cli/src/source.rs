use loom_assets::ImageSource;
use loom_core::SourceError;
use loom_engine::DesignSource;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Reads design trees and images from the local file system.
///
/// Image references are resolved against the directory of the design file.
/// Remote references are not supported.
#[derive(Debug, Clone)]
pub struct FileSource {
    base: PathBuf,
}

impl FileSource {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// A source rooted at the directory containing `design`.
    pub fn for_design(design: &Path) -> Self {
        Self::new(design.parent().unwrap_or_else(|| Path::new(".")))
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, SourceError> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Err(SourceError::Unsupported(reference.to_string()));
        }
        let path = Path::new(reference.strip_prefix("file://").unwrap_or(reference));
        Ok(if path.is_absolute() { path.to_path_buf() } else { self.base.join(path) })
    }
}

fn read_error(reference: &str, err: io::Error) -> SourceError {
    if err.kind() == io::ErrorKind::NotFound {
        SourceError::NotFound(reference.to_string())
    } else {
        SourceError::Io(err)
    }
}

impl ImageSource for FileSource {
    async fn fetch_image_bytes(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.resolve(reference)?;
        fs::read(&path).await.map_err(|err| read_error(reference, err))
    }
}

impl DesignSource for FileSource {
    async fn fetch_design_tree(&self, reference: &str) -> Result<String, SourceError> {
        let path = self.resolve(reference)?;
        fs::read_to_string(&path).await.map_err(|err| read_error(reference, err))
    }
}
