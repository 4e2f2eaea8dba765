//! Manifest and index decoding.
//!
//! A manifest graph is a rooted, content-addressed DAG: the root descriptor
//! is resolved from a reference, and every other node is reachable through
//! `successors`. Manifests reference a config blob and layer blobs; indexes
//! reference child manifests; everything else is a leaf.

use serde::{Deserialize, Serialize};

use crate::descriptor::{media_types, Descriptor};
use crate::error::{CoreError, Result};

/// An OCI image manifest: one config blob plus ordered layer blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    /// Schema version (always 2 for this format).
    pub schema_version: u32,
    /// Media type of the manifest itself.
    #[serde(default)]
    pub media_type: Option<String>,
    /// Configuration blob descriptor.
    pub config: Descriptor,
    /// Layer blob descriptors, in application order.
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

/// An OCI image index: a manifest of manifests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIndex {
    /// Schema version (always 2 for this format).
    pub schema_version: u32,
    /// Media type of the index itself.
    #[serde(default)]
    pub media_type: Option<String>,
    /// Child manifest descriptors.
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
}

/// Decode the successors of a node from its raw bytes.
///
/// Manifests yield their config descriptor followed by layers; indexes yield
/// their child manifests; any other media type is a leaf and yields nothing.
/// Callers only need to fetch bytes for media types that can have successors,
/// so leaf blobs are never parsed.
pub fn successors(media_type: &str, data: &[u8]) -> Result<Vec<Descriptor>> {
    match media_type {
        media_types::IMAGE_MANIFEST => {
            let manifest: ImageManifest =
                serde_json::from_slice(data).map_err(|e| CoreError::InvalidManifest {
                    media_type: media_type.to_string(),
                    detail: e.to_string(),
                })?;
            let mut out = Vec::with_capacity(1 + manifest.layers.len());
            out.push(manifest.config);
            out.extend(manifest.layers);
            Ok(out)
        }
        media_types::IMAGE_INDEX => {
            let index: ImageIndex =
                serde_json::from_slice(data).map_err(|e| CoreError::InvalidManifest {
                    media_type: media_type.to_string(),
                    detail: e.to_string(),
                })?;
            Ok(index.manifests)
        }
        _ => Ok(Vec::new()),
    }
}

/// Whether a media type can have successors at all.
pub fn has_successors(media_type: &str) -> bool {
    matches!(
        media_type,
        media_types::IMAGE_MANIFEST | media_types::IMAGE_INDEX
    )
}
