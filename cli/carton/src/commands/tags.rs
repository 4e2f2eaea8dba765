//! `carton tags`: list published tags for a repository.

use std::path::Path;

use anyhow::{bail, Result};

use carton_core::Reference;
use carton_pull::LocalRegistry;

/// Run `carton tags <registry/repository>`.
///
/// The reference must name a bare repository; listing tags of a tagged
/// reference is rejected. `prefix` is prepended to every printed tag (used
/// by `metadata` for indented output).
pub fn run(registry_root: &Path, target_ref: &str, prefix: &str) -> Result<()> {
    let reference = Reference::parse(target_ref)?;
    if reference.tag.is_some() || reference.digest.is_some() {
        bail!("target repository must not contain a version tag");
    }

    let registry = LocalRegistry::new(registry_root.to_path_buf());
    for tag in registry.tags(&reference.repository)? {
        println!("{prefix}{tag}");
    }
    Ok(())
}
