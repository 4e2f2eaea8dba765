//! `carton pull`: pull an artifact's files from a registry.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use carton_core::{media_types, Reference};
use carton_pull::{
    pull, ArtifactStore, BlobCache, CachingStore, CancelToken, ConfigOverride, LocalRegistry,
    LockRecorder, NoopObserver, PullObserver, PullPolicy,
};

use crate::display::StatusDisplay;

/// Options for one pull, shared with `resolve` and `metadata`.
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Output directory (default: current directory).
    pub output: Option<PathBuf>,
    /// Fail instead of replacing existing files.
    pub keep_old_files: bool,
    /// Permit titles to write outside the output directory.
    pub allow_path_traversal: bool,
    /// `path[:mediatype]` redirect for the manifest config blob.
    pub manifest_config: Option<String>,
    /// Media type that must appear somewhere in the pulled tree.
    pub required_media_type: Option<String>,
    /// Suppress status output.
    pub quiet: bool,
    /// Lock file to append audit entries to.
    pub lock_file: Option<PathBuf>,
    /// Blob cache root; no cache when absent.
    pub cache_root: Option<PathBuf>,
}

/// Run `carton pull <reference>`.
pub fn run(registry_root: &Path, target_ref: &str, opts: &PullOptions) -> Result<()> {
    let reference = Reference::parse(target_ref)?;
    if !reference.is_resolvable() {
        bail!("reference '{target_ref}' has no tag or digest to pull");
    }

    let registry = LocalRegistry::new(registry_root.to_path_buf());
    match &opts.cache_root {
        Some(cache_root) => {
            let store = CachingStore::new(registry, BlobCache::new(cache_root.clone()));
            execute(&store, &reference, target_ref, opts)
        }
        None => execute(&registry, &reference, target_ref, opts),
    }
}

/// Resolve, walk, and materialize against a concrete store.
fn execute(
    store: &impl ArtifactStore,
    reference: &Reference,
    target_ref: &str,
    opts: &PullOptions,
) -> Result<()> {
    let policy = PullPolicy {
        required_media_type: opts.required_media_type.clone(),
        output_root: opts.output.clone().unwrap_or_else(|| PathBuf::from(".")),
        allow_path_escape: opts.allow_path_traversal,
        disallow_overwrite: opts.keep_old_files,
        config_override: opts.manifest_config.as_deref().map(parse_file_ref),
    };

    let mut recorder = match &opts.lock_file {
        Some(path) => LockRecorder::new(path.clone()),
        None => LockRecorder::disabled(),
    };

    let status = StatusDisplay;
    let noop = NoopObserver;
    let observer: &dyn PullObserver = if opts.quiet { &noop } else { &status };

    let outcome = pull(
        store,
        reference,
        &policy,
        observer,
        &mut recorder,
        &CancelToken::new(),
    )
    .with_context(|| format!("pulling {target_ref}"))?;

    if !opts.quiet {
        if outcome.files_written == 0 {
            println!("Downloaded empty artifact");
        }
        println!("Pulled {target_ref}");
        println!("Digest: {}", outcome.root.digest);
    }
    Ok(())
}

/// Split a `path[:mediatype]` value, defaulting the media type for plain
/// config blobs.
pub fn parse_file_ref(value: &str) -> ConfigOverride {
    match value.split_once(':') {
        Some((path, media_type)) if !media_type.is_empty() => ConfigOverride {
            path: path.to_string(),
            media_type: media_type.to_string(),
        },
        _ => ConfigOverride {
            path: value.trim_end_matches(':').to_string(),
            media_type: media_types::UNKNOWN_CONFIG.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carton_core::{Descriptor, ImageManifest};

    fn publish(registry_root: &Path) -> String {
        let registry = LocalRegistry::new(registry_root.to_path_buf());
        let config = registry
            .put_blob(media_types::UNKNOWN_CONFIG, b"{}")
            .unwrap();
        let mut layer = registry.put_blob(media_types::LAYER, b"hello").unwrap();
        layer.set_title("hello.txt");
        let manifest = ImageManifest {
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
        registry.tag("hello", "latest", &root).unwrap();
        "localhost:5000/hello:latest".to_string()
    }

    #[test]
    fn pull_writes_files() {
        let registry_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let target = publish(registry_dir.path());

        let opts = PullOptions {
            output: Some(out_dir.path().to_path_buf()),
            quiet: true,
            ..PullOptions::default()
        };
        run(registry_dir.path(), &target, &opts).unwrap();
        assert_eq!(
            std::fs::read(out_dir.path().join("hello.txt")).unwrap(),
            b"hello"
        );
    }

    #[test]
    fn pull_through_cache_populates_it() {
        let registry_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let target = publish(registry_dir.path());

        let opts = PullOptions {
            output: Some(out_dir.path().to_path_buf()),
            cache_root: Some(cache_dir.path().to_path_buf()),
            quiet: true,
            ..PullOptions::default()
        };
        run(registry_dir.path(), &target, &opts).unwrap();

        let layer_digest = Descriptor::from_bytes(media_types::LAYER, b"hello").digest;
        assert!(BlobCache::new(cache_dir.path().to_path_buf()).contains(&layer_digest));
    }

    #[test]
    fn rejects_unpullable_reference() {
        let registry_dir = tempfile::tempdir().unwrap();
        let result = run(
            registry_dir.path(),
            "localhost:5000/hello",
            &PullOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn parse_file_ref_with_media_type() {
        let r = parse_file_ref("config.json:application/vnd.acme.config.v1+json");
        assert_eq!(r.path, "config.json");
        assert_eq!(r.media_type, "application/vnd.acme.config.v1+json");
    }

    #[test]
    fn parse_file_ref_defaults_media_type() {
        let r = parse_file_ref("config.json");
        assert_eq!(r.path, "config.json");
        assert_eq!(r.media_type, media_types::UNKNOWN_CONFIG);
    }
}
