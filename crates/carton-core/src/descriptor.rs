//! Content descriptors.
//!
//! A descriptor is a content-addressed pointer: media type, digest, size, and
//! free-form annotations. The title annotation names the file a blob should
//! be written to; descriptors without it are intermediate nodes (manifests,
//! configs) and are not materialized as named files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;

/// Annotation key carrying a descriptor's intended filename.
pub const ANNOTATION_TITLE: &str = "org.opencontainers.image.title";

/// Well-known media types.
pub mod media_types {
    /// OCI image manifest.
    pub const IMAGE_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
    /// OCI image index (manifest list).
    pub const IMAGE_INDEX: &str = "application/vnd.oci.image.index.v1+json";
    /// Configuration blob of unknown artifact type.
    pub const UNKNOWN_CONFIG: &str = "application/vnd.unknown.config.v1+json";
    /// Generic layer blob.
    pub const LAYER: &str = "application/vnd.oci.image.layer.v1.tar";
}

/// A content-addressed pointer to a blob or manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content.
    pub media_type: String,
    /// Content digest (identity of the referenced bytes).
    pub digest: Digest,
    /// Size of the referenced content in bytes.
    pub size: u64,
    /// Free-form annotations. Sorted map so serialized output is stable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Descriptor {
    /// Build a descriptor for the given bytes.
    pub fn from_bytes(media_type: impl Into<String>, data: &[u8]) -> Self {
        Descriptor {
            media_type: media_type.into(),
            digest: Digest::from_bytes(data),
            size: data.len() as u64,
            annotations: BTreeMap::new(),
        }
    }

    /// The title annotation value, if present and non-empty.
    pub fn title(&self) -> Option<&str> {
        self.annotations
            .get(ANNOTATION_TITLE)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Set the title annotation, replacing any existing value.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.annotations
            .insert(ANNOTATION_TITLE.to_string(), title.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_fills_digest_and_size() {
        let desc = Descriptor::from_bytes(media_types::LAYER, b"abc");
        assert_eq!(desc.size, 3);
        assert!(desc.digest.verify(b"abc"));
        assert!(desc.title().is_none());
    }

    #[test]
    fn title_annotation() {
        let mut desc = Descriptor::from_bytes(media_types::LAYER, b"x");
        desc.set_title("layer.tar");
        assert_eq!(desc.title(), Some("layer.tar"));
        desc.set_title("renamed.tar");
        assert_eq!(desc.title(), Some("renamed.tar"));
    }

    #[test]
    fn empty_title_treated_as_unnamed() {
        let mut desc = Descriptor::from_bytes(media_types::LAYER, b"x");
        desc.annotations
            .insert(ANNOTATION_TITLE.to_string(), String::new());
        assert!(desc.title().is_none());
    }

    #[test]
    fn serde_uses_oci_field_names() {
        let desc = Descriptor::from_bytes(media_types::IMAGE_MANIFEST, b"{}");
        let json = serde_json::to_string(&desc).unwrap();
        assert!(json.contains("\"mediaType\""));
        assert!(json.contains("\"digest\":\"sha256:"));
        // Empty annotations are omitted entirely.
        assert!(!json.contains("annotations"));

        let back: Descriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}
