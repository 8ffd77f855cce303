use loom_assets::ImageSource;
use loom_core::SourceError;
use std::future::Future;

/// Supplies design trees and the image payloads they reference.
pub trait DesignSource: ImageSource {
    /// Fetch the raw JSON design tree identified by `reference`.
    fn fetch_design_tree(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<String, SourceError>> + Send;
}

impl<S: DesignSource> DesignSource for &S {
    fn fetch_design_tree(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<String, SourceError>> + Send {
        (**self).fetch_design_tree(reference)
    }
}
