//! Destination file sink.
//!
//! Writes blob bytes to the filesystem at the path named by a descriptor's
//! title annotation, relative to the output root. Paths escaping the root
//! are rejected unless explicitly allowed: a manifest is untrusted input,
//! and a title of `../../etc/passwd` must not land outside the output
//! directory. Untitled descriptors produce no file.

use std::path::{Component, Path, PathBuf};

use carton_core::Descriptor;

use crate::error::{PullError, Result};

/// Writes materialized blobs under an output root.
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
    allow_path_escape: bool,
    disallow_overwrite: bool,
}

impl FileSink {
    /// Create a sink rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        FileSink {
            root,
            allow_path_escape: false,
            disallow_overwrite: false,
        }
    }

    /// Permit title annotations to resolve outside the output root.
    pub fn allow_path_escape(mut self, allow: bool) -> Self {
        self.allow_path_escape = allow;
        self
    }

    /// Fail instead of replacing files that already exist.
    pub fn disallow_overwrite(mut self, disallow: bool) -> Self {
        self.disallow_overwrite = disallow;
        self
    }

    /// Write a descriptor's bytes to its titled path.
    ///
    /// Returns the path written, or `None` for untitled descriptors (which
    /// are not materialized).
    pub fn write(&self, desc: &Descriptor, data: &[u8]) -> Result<Option<PathBuf>> {
        let Some(title) = desc.title() else {
            return Ok(None);
        };

        let target = self.root.join(title);
        if !self.allow_path_escape && escapes_root(Path::new(title)) {
            return Err(PullError::PathEscape { path: target });
        }
        if self.disallow_overwrite && target.exists() {
            return Err(PullError::OverwriteConflict { path: target });
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PullError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&target, data).map_err(|e| PullError::Write {
            path: target.clone(),
            source: e,
        })?;
        tracing::debug!(path = %target.display(), size = data.len(), "wrote file");
        Ok(Some(target))
    }
}

/// Whether a relative title path walks above the output root.
///
/// Checked lexically, since the target may not exist yet and `canonicalize` is
/// not an option. Absolute titles always escape.
fn escapes_root(title: &Path) -> bool {
    if title.is_absolute() {
        return true;
    }
    let mut depth: i64 = 0;
    for component in title.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return true,
        }
    }
    false
}
