//! The asset manifest artifact.

use loom_assets::AssetSet;
use loom_core::NodeId;
use serde::{Deserialize, Serialize};

/// Manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

/// Directory, relative to the output directory, that holds asset files.
pub const ASSET_DIR: &str = "assets";

/// Serialized form of a run's assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub version: u32,
    pub assets: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub file_name: String,
    /// SHA-256 of the bytes; `null` for placeholders.
    pub fingerprint: Option<String>,
    pub nodes: Vec<NodeId>,
    /// Output-relative path the component refers to.
    pub path: String,
    /// Why the image was replaced by a placeholder.
    pub placeholder: Option<String>,
}

impl AssetManifest {
    pub fn from_assets(assets: &AssetSet) -> Self {
        Self {
            version: MANIFEST_VERSION,
            assets: assets
                .records()
                .map(|record| ManifestEntry {
                    file_name: record.file_name.clone(),
                    fingerprint: record.fingerprint.as_ref().map(|fp| fp.as_str().to_string()),
                    nodes: record.nodes.clone(),
                    path: asset_path(&record.file_name),
                    placeholder: record.placeholder.clone(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Output-relative path of an asset file.
pub fn asset_path(file_name: &str) -> String {
    format!("{ASSET_DIR}/{file_name}")
}
