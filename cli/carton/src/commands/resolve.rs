//! `carton resolve`: pull a batch of references, recording a lock file.
//!
//! Each reference is pulled in turn; every named file appends an entry to
//! the shared lock file, so one session's audit trail covers the whole
//! batch in materialization order. A failing reference is reported and the
//! batch continues.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::commands::pull::{self, PullOptions};

/// Default lock file for resolve sessions.
const DEFAULT_LOCK_FILE: &str = "carton.lock";

/// Run `carton resolve <ref,ref,...>`.
pub fn run(
    registry_root: &Path,
    references: &str,
    output: Option<PathBuf>,
    lock_file: Option<PathBuf>,
    cache_root: Option<PathBuf>,
) -> Result<()> {
    let lock_file = lock_file.unwrap_or_else(|| PathBuf::from(DEFAULT_LOCK_FILE));

    for reference in references.split(',').filter(|r| !r.is_empty()) {
        println!("Fetching reference: {reference}");
        let opts = PullOptions {
            output: output.clone(),
            lock_file: Some(lock_file.clone()),
            cache_root: cache_root.clone(),
            ..PullOptions::default()
        };
        if let Err(e) = pull::run(registry_root, reference, &opts) {
            tracing::warn!(reference, "pull failed: {e:#}");
            eprintln!("warning: {reference}: {e:#}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carton_core::media_types;
    use carton_pull::LocalRegistry;

    fn publish(registry: &LocalRegistry, repo: &str, title: &str, data: &[u8]) {
        let config = registry
            .put_blob(media_types::UNKNOWN_CONFIG, b"{}")
            .unwrap();
        let mut layer = registry.put_blob(media_types::LAYER, data).unwrap();
        layer.set_title(title);
        let manifest = carton_core::ImageManifest {
            schema_version: 2,
            media_type: Some(media_types::IMAGE_MANIFEST.to_string()),
            config,
            layers: vec![layer],
        };
        let root = registry
            .put_manifest(
                media_types::IMAGE_MANIFEST,
                &serde_json::to_vec(&manifest).unwrap(),
            )
            .unwrap();
        registry.tag(repo, "v1", &root).unwrap();
    }

    #[test]
    fn batch_appends_one_lock_file() {
        let registry_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(registry_dir.path().to_path_buf());
        publish(&registry, "alpha", "a.txt", b"a");
        publish(&registry, "beta", "b.txt", b"b");

        let lock_path = out_dir.path().join("session.lock");
        run(
            registry_dir.path(),
            "localhost:5000/alpha:v1,localhost:5000/beta:v1",
            Some(out_dir.path().to_path_buf()),
            Some(lock_path.clone()),
            None,
        )
        .unwrap();

        let lock = std::fs::read_to_string(&lock_path).unwrap();
        let a = lock.find("a.txt").unwrap();
        let b = lock.find("b.txt").unwrap();
        assert!(a < b);
    }

    #[test]
    fn failing_reference_does_not_stop_batch() {
        let registry_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let registry = LocalRegistry::new(registry_dir.path().to_path_buf());
        publish(&registry, "good", "good.txt", b"ok");

        run(
            registry_dir.path(),
            "localhost:5000/missing:v1,localhost:5000/good:v1",
            Some(out_dir.path().to_path_buf()),
            Some(out_dir.path().join("session.lock")),
            None,
        )
        .unwrap();

        assert!(out_dir.path().join("good.txt").is_file());
    }
}
