use loom_core::SourceError;
use std::future::Future;

/// Supplies binary image payloads by reference.
///
/// The transport (HTTP, local files, an in-memory fixture) and any
/// authentication are the implementor's concern. Implementations are shared
/// across concurrent fetches.
pub trait ImageSource: Send + Sync {
    fn fetch_image_bytes(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Vec<u8>, SourceError>> + Send;
}

impl<S: ImageSource> ImageSource for &S {
    fn fetch_image_bytes(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Vec<u8>, SourceError>> + Send {
        (**self).fetch_image_bytes(reference)
    }
}
