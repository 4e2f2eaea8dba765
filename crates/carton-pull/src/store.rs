//! Artifact store trait and local filesystem implementation.
//!
//! `ArtifactStore` abstracts over registry backends: resolving a reference to
//! a root descriptor, fetching content by descriptor, and listing a node's
//! successors. `LocalRegistry` is a filesystem-backed store for development
//! and testing; the registry wire protocol itself is out of scope and would
//! plug in behind the same trait.

use std::path::{Path, PathBuf};

use carton_core::{manifest, Descriptor, Digest, Reference};

use crate::error::{PullError, Result};

/// Abstract content-addressable artifact store.
pub trait ArtifactStore {
    /// Resolve a reference to its root descriptor.
    fn resolve(&self, reference: &Reference) -> Result<Descriptor>;

    /// Fetch the bytes a descriptor points at.
    fn fetch(&self, desc: &Descriptor) -> Result<Vec<u8>>;

    /// List the descriptors a node references.
    ///
    /// Leaf media types yield no successors without a fetch; manifest and
    /// index media types are fetched and decoded.
    fn successors(&self, desc: &Descriptor) -> Result<Vec<Descriptor>> {
        if !manifest::has_successors(&desc.media_type) {
            return Ok(Vec::new());
        }
        let data = self.fetch(desc)?;
        Ok(manifest::successors(&desc.media_type, &data)?)
    }
}

/// A local filesystem registry for development and testing.
///
/// Layout:
/// ```text
/// <root>/
///   blobs/sha256/<hex>            blob and manifest content
///   refs/<repository>/<tag>      descriptor pointer for a tag
/// ```
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    /// Open a registry rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        LocalRegistry { root }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, digest: &Digest) -> PathBuf {
        self.root
            .join("blobs")
            .join(digest.algorithm())
            .join(digest.hex())
    }

    fn tag_path(&self, repository: &str, tag: &str) -> PathBuf {
        self.root.join("refs").join(repository).join(tag)
    }

    /// Store a blob, returning its descriptor.
    pub fn put_blob(&self, media_type: &str, data: &[u8]) -> Result<Descriptor> {
        let desc = Descriptor::from_bytes(media_type, data);
        let path = self.blob_path(&desc.digest);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, data)?;
        Ok(desc)
    }

    /// Store a manifest or index, returning its descriptor.
    ///
    /// Same storage as `put_blob`; exists so call sites read naturally.
    pub fn put_manifest(&self, media_type: &str, data: &[u8]) -> Result<Descriptor> {
        self.put_blob(media_type, data)
    }

    /// Point a tag at a root descriptor.
    pub fn tag(&self, repository: &str, tag: &str, desc: &Descriptor) -> Result<()> {
        let path = self.tag_path(repository, tag);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let pointer = serde_json::to_vec(desc).map_err(carton_core::CoreError::from)?;
        std::fs::write(&path, pointer).map_err(PullError::Io)
    }

    /// List all tags published for a repository, sorted.
    pub fn tags(&self, repository: &str) -> Result<Vec<String>> {
        let dir = self.root.join("refs").join(repository);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut tags = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.path().is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    tags.push(name.to_string());
                }
            }
        }
        tags.sort();
        Ok(tags)
    }
}

impl ArtifactStore for LocalRegistry {
    fn resolve(&self, reference: &Reference) -> Result<Descriptor> {
        if let Some(digest) = &reference.digest {
            // Digest references resolve to whatever the blob store holds;
            // the descriptor is reconstructed from the content itself.
            let data = std::fs::read(self.blob_path(digest)).map_err(|e| {
                PullError::Resolution {
                    reference: reference.to_string(),
                    detail: e.to_string(),
                }
            })?;
            let mut desc = Descriptor::from_bytes(carton_core::media_types::IMAGE_MANIFEST, &data);
            desc.digest = digest.clone();
            return Ok(desc);
        }

        let Some(tag) = &reference.tag else {
            return Err(PullError::Resolution {
                reference: reference.to_string(),
                detail: "reference has neither tag nor digest".to_string(),
            });
        };

        let path = self.tag_path(&reference.repository, tag);
        let pointer = std::fs::read(&path).map_err(|e| PullError::Resolution {
            reference: reference.to_string(),
            detail: e.to_string(),
        })?;
        let desc: Descriptor =
            serde_json::from_slice(&pointer).map_err(|e| PullError::Resolution {
                reference: reference.to_string(),
                detail: format!("corrupt tag pointer: {e}"),
            })?;
        tracing::debug!(reference = %reference, digest = %desc.digest, "resolved reference");
        Ok(desc)
    }

    fn fetch(&self, desc: &Descriptor) -> Result<Vec<u8>> {
        let path = self.blob_path(&desc.digest);
        if !path.is_file() {
            return Err(PullError::BlobNotFound {
                digest: desc.digest.to_string(),
            });
        }
        let data = std::fs::read(&path).map_err(|e| PullError::Fetch {
            digest: desc.digest.to_string(),
            detail: e.to_string(),
        })?;
        tracing::trace!(digest = %desc.digest, size = data.len(), "fetched blob");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carton_core::media_types;

    fn registry() -> (tempfile::TempDir, LocalRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(dir.path().to_path_buf());
        (dir, registry)
    }

    #[test]
    fn put_and_fetch_blob() {
        let (_dir, registry) = registry();
        let desc = registry.put_blob(media_types::LAYER, b"blob bytes").unwrap();
        let data = registry.fetch(&desc).unwrap();
        assert_eq!(data, b"blob bytes");
        assert!(desc.digest.verify(&data));
    }

    #[test]
    fn fetch_missing_blob() {
        let (_dir, registry) = registry();
        let desc = Descriptor::from_bytes(media_types::LAYER, b"never stored");
        let result = registry.fetch(&desc);
        assert!(matches!(result, Err(PullError::BlobNotFound { .. })));
    }

    #[test]
    fn resolve_by_tag() {
        let (_dir, registry) = registry();
        let desc = registry
            .put_manifest(media_types::IMAGE_MANIFEST, b"{\"schemaVersion\":2}")
            .unwrap();
        registry.tag("hello", "latest", &desc).unwrap();

        let reference = Reference::parse("localhost:5000/hello:latest").unwrap();
        let resolved = registry.resolve(&reference).unwrap();
        assert_eq!(resolved.digest, desc.digest);
    }

    #[test]
    fn resolve_unknown_tag() {
        let (_dir, registry) = registry();
        let reference = Reference::parse("localhost:5000/hello:nope").unwrap();
        let result = registry.resolve(&reference);
        assert!(matches!(result, Err(PullError::Resolution { .. })));
    }

    #[test]
    fn resolve_unresolvable_reference() {
        let (_dir, registry) = registry();
        let reference = Reference::parse("localhost:5000/hello").unwrap();
        let result = registry.resolve(&reference);
        assert!(matches!(result, Err(PullError::Resolution { .. })));
    }

    #[test]
    fn tags_sorted() {
        let (_dir, registry) = registry();
        let desc = registry.put_blob(media_types::LAYER, b"x").unwrap();
        registry.tag("repo", "v2", &desc).unwrap();
        registry.tag("repo", "latest", &desc).unwrap();
        registry.tag("repo", "v1", &desc).unwrap();

        assert_eq!(registry.tags("repo").unwrap(), vec!["latest", "v1", "v2"]);
        assert!(registry.tags("unknown").unwrap().is_empty());
    }

    #[test]
    fn successors_of_leaf_skip_fetch() {
        let (_dir, registry) = registry();
        // Descriptor points at content that was never stored; a leaf media
        // type must not attempt the fetch.
        let desc = Descriptor::from_bytes(media_types::LAYER, b"absent");
        assert!(registry.successors(&desc).unwrap().is_empty());
    }
}
