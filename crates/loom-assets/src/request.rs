//! Image discovery.

use indexmap::IndexMap;
use loom_core::{DesignDocument, NodeId};
use smallvec::SmallVec;

/// One unique image reference and the nodes that use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub reference: String,
    pub nodes: SmallVec<[NodeId; 2]>,
    /// Set when any referencing node marks the image as required.
    pub required: bool,
}

/// Collect the image references of a document, in first-encounter order.
///
/// Images on nodes that do not render them are skipped.
pub fn collect(doc: &DesignDocument) -> Vec<AssetRequest> {
    let mut requests: IndexMap<&str, AssetRequest> = IndexMap::new();

    for visit in doc.depth_first() {
        let Some(image) = visit.node.image.as_ref().filter(|_| visit.node.kind.renders_image()) else {
            continue;
        };
        let request = requests.entry(image.reference.as_str()).or_insert_with(|| AssetRequest {
            reference: image.reference.clone(),
            nodes: SmallVec::new(),
            required: false,
        });
        request.nodes.push(visit.node.id.clone());
        request.required |= image.required;
    }

    requests.into_values().collect()
}
