//! `carton metadata`: fetch and display collection metadata.
//!
//! Pulls a collection artifact quietly into a temporary directory,
//! requiring the collection media type to be present (so a non-collection
//! artifact fails with a policy violation rather than junk output), then
//! decodes the collection JSON and lists each feature with its published
//! tags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use carton_core::Reference;

use crate::commands::{pull, tags};
use crate::commands::pull::PullOptions;

/// Media type that marks a collection metadata layer.
pub const COLLECTION_MEDIA_TYPE: &str = "application/vnd.devcontainers.collection.layer.v1+json";

/// File name the collection layer materializes as.
const COLLECTION_FILE: &str = "devcontainer-collection.json";

/// Collection metadata document. Only the fields this command consumes are
/// modeled; unknown fields (templates, feature details) are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub source_information: SourceInformation,
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// Where the collection was built from.
#[derive(Debug, Deserialize)]
pub struct SourceInformation {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub sha: String,
}

/// One published feature in the collection.
#[derive(Debug, Deserialize)]
pub struct Feature {
    pub id: String,
}

/// Run `carton metadata <registry/repository[:tag]>`.
pub fn run(registry_root: &Path, target_ref: &str, cache_root: Option<PathBuf>) -> Result<()> {
    // Untagged references default to :latest.
    let mut reference = Reference::parse(target_ref)?;
    if !reference.is_resolvable() {
        reference.tag = Some("latest".to_string());
    }

    let scratch = tempfile::tempdir().context("creating scratch directory")?;
    let opts = PullOptions {
        output: Some(scratch.path().to_path_buf()),
        required_media_type: Some(COLLECTION_MEDIA_TYPE.to_string()),
        quiet: true,
        cache_root,
        ..PullOptions::default()
    };
    pull::run(registry_root, &reference.to_string(), &opts)?;

    let collection_path = scratch.path().join(COLLECTION_FILE);
    let data = std::fs::read(&collection_path)
        .with_context(|| format!("reading {}", collection_path.display()))?;
    let collection: Collection =
        serde_json::from_slice(&data).context("decoding collection metadata")?;

    println!(
        "Source Code: https://github.com/{}/{}",
        collection.source_information.owner, collection.source_information.repo
    );
    println!("Commit:      {}\n", collection.source_information.sha);

    println!("Available Features:");
    for feature in &collection.features {
        println!("{}", feature.id);
        let feature_ref = format!(
            "{}/{}/{}",
            reference.registry, reference.repository, feature.id
        );
        tags::run(registry_root, &feature_ref, "   ")?;
    }

    Ok(())
}
