//! Digest-keyed blob cache and the caching store overlay.
//!
//! `BlobCache` stores fetched bytes on disk keyed by digest. `CachingStore`
//! interposes it between the engine and a remote store: fetches are served
//! locally when possible and written back on miss. Resolution and successor
//! listing always go to the remote: tag pointers can move, and successor
//! lists are metadata, not payload.
//!
//! Content is immutable, so cache entries never go stale and there is no
//! eviction. Cache failures surface as errors rather than falling back to
//! the remote: a corrupt cache masking itself would hide integrity problems.

use std::path::{Path, PathBuf};

use carton_core::{Descriptor, Digest, Reference};

use crate::error::{PullError, Result};
use crate::store::ArtifactStore;

/// A local digest-keyed content store.
#[derive(Debug, Clone)]
pub struct BlobCache {
    root: PathBuf,
}

impl BlobCache {
    /// Open a cache rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        BlobCache { root }
    }

    /// Get the root directory of this cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, digest: &Digest) -> PathBuf {
        self.root
            .join("blobs")
            .join(digest.algorithm())
            .join(digest.hex())
    }

    /// Check whether a digest is present.
    pub fn contains(&self, digest: &Digest) -> bool {
        self.entry_path(digest).is_file()
    }

    /// Read cached bytes for a digest, if present.
    pub fn get(&self, digest: &Digest) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(digest);
        if !path.is_file() {
            return Ok(None);
        }
        let data = std::fs::read(&path).map_err(|e| PullError::Cache {
            path,
            detail: format!("reading entry: {e}"),
        })?;
        Ok(Some(data))
    }

    /// Store bytes under their digest.
    ///
    /// Written via a temp file and renamed into place, so two processes
    /// caching the same digest cannot leave a torn entry behind; last writer
    /// wins over identical bytes.
    pub fn put(&self, digest: &Digest, data: &[u8]) -> Result<()> {
        let dir = self.root.join("blobs").join(digest.algorithm());
        let path = dir.join(digest.hex());
        std::fs::create_dir_all(&dir).map_err(|e| PullError::Cache {
            path: dir.clone(),
            detail: format!("creating cache dir: {e}"),
        })?;

        let tmp = dir.join(format!(".{}.tmp-{}", digest.hex(), std::process::id()));
        std::fs::write(&tmp, data).map_err(|e| PullError::Cache {
            path: tmp.clone(),
            detail: format!("writing entry: {e}"),
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| PullError::Cache {
            path,
            detail: format!("committing entry: {e}"),
        })?;
        Ok(())
    }
}

/// A store overlay that serves fetches from a local cache.
pub struct CachingStore<S> {
    remote: S,
    cache: BlobCache,
}

impl<S: ArtifactStore> CachingStore<S> {
    /// Wrap a remote store with a local blob cache.
    pub fn new(remote: S, cache: BlobCache) -> Self {
        CachingStore { remote, cache }
    }

    /// Access the wrapped remote store.
    pub fn remote(&self) -> &S {
        &self.remote
    }
}

impl<S: ArtifactStore> ArtifactStore for CachingStore<S> {
    fn resolve(&self, reference: &Reference) -> Result<Descriptor> {
        self.remote.resolve(reference)
    }

    fn fetch(&self, desc: &Descriptor) -> Result<Vec<u8>> {
        if let Some(data) = self.cache.get(&desc.digest)? {
            tracing::debug!(digest = %desc.digest, "cache hit");
            return Ok(data);
        }
        let data = self.remote.fetch(desc)?;
        self.cache.put(&desc.digest, &data)?;
        tracing::debug!(digest = %desc.digest, size = data.len(), "cached after miss");
        Ok(data)
    }

    fn successors(&self, desc: &Descriptor) -> Result<Vec<Descriptor>> {
        self.remote.successors(desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalRegistry;
    use carton_core::media_types;
    use std::cell::Cell;

    /// Store wrapper that counts fetches, for asserting cache behavior.
    struct CountingStore {
        inner: LocalRegistry,
        fetches: Cell<usize>,
    }

    impl ArtifactStore for CountingStore {
        fn resolve(&self, reference: &Reference) -> Result<Descriptor> {
            self.inner.resolve(reference)
        }

        fn fetch(&self, desc: &Descriptor) -> Result<Vec<u8>> {
            self.fetches.set(self.fetches.get() + 1);
            self.inner.fetch(desc)
        }
    }

    #[test]
    fn second_fetch_served_from_cache() {
        let remote_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(remote_dir.path().to_path_buf());
        let desc = registry.put_blob(media_types::LAYER, b"payload").unwrap();

        let counting = CountingStore {
            inner: registry,
            fetches: Cell::new(0),
        };
        let store = CachingStore::new(counting, BlobCache::new(cache_dir.path().to_path_buf()));

        assert_eq!(store.fetch(&desc).unwrap(), b"payload");
        assert_eq!(store.fetch(&desc).unwrap(), b"payload");
        assert_eq!(store.remote().fetches.get(), 1);
    }

    #[test]
    fn miss_populates_cache() {
        let remote_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(remote_dir.path().to_path_buf());
        let desc = registry.put_blob(media_types::LAYER, b"data").unwrap();

        let cache = BlobCache::new(cache_dir.path().to_path_buf());
        let store = CachingStore::new(registry, cache.clone());

        assert!(!cache.contains(&desc.digest));
        store.fetch(&desc).unwrap();
        assert!(cache.contains(&desc.digest));
        assert_eq!(cache.get(&desc.digest).unwrap().unwrap(), b"data");
    }

    #[test]
    fn unreadable_cache_entry_is_an_error() {
        let remote_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(remote_dir.path().to_path_buf());
        let desc = registry.put_blob(media_types::LAYER, b"data").unwrap();

        let cache = BlobCache::new(cache_dir.path().to_path_buf());
        // Occupy the entry path with a directory so the read fails rather
        // than missing.
        let entry = cache_dir
            .path()
            .join("blobs")
            .join(desc.digest.algorithm())
            .join(desc.digest.hex());
        std::fs::create_dir_all(entry.join("oops")).unwrap();

        let store = CachingStore::new(registry, cache);
        let result = store.fetch(&desc);
        assert!(matches!(result, Err(PullError::Cache { .. })));
    }

    #[test]
    fn put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BlobCache::new(dir.path().to_path_buf());
        let digest = Digest::from_bytes(b"immutable");
        cache.put(&digest, b"immutable").unwrap();
        cache.put(&digest, b"immutable").unwrap();
        assert_eq!(cache.get(&digest).unwrap().unwrap(), b"immutable");
    }
}
