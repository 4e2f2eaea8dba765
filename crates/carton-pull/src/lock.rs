//! Append-only lock file recording.
//!
//! One entry per materialized file, in copy order. Entries accumulate in
//! memory during a pull and are appended to the lock file in a single
//! commit at the end, so a failed pull records nothing. The file is a
//! durable audit trail across invocations: committed blocks are never
//! rewritten or reordered.

use std::io::Write as _;
use std::path::PathBuf;

use fs2::FileExt;

use carton_core::{Descriptor, Reference};

use crate::error::Result;

/// Audit record of one materialized file's provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEntry {
    /// The reference string as requested by the caller.
    pub target_ref: String,
    /// The tag or digest the reference resolved through.
    pub resolved_ref: String,
    /// Registry host.
    pub registry: String,
    /// Content digest of the file.
    pub digest: String,
    /// Title annotation value (the file's name).
    pub title: String,
    /// Media type of the file.
    pub media_type: String,
}

impl LockEntry {
    /// Build an entry from a written descriptor and its reference context.
    pub fn new(reference: &Reference, desc: &Descriptor) -> Self {
        LockEntry {
            target_ref: reference.to_string(),
            resolved_ref: reference.reference(),
            registry: reference.registry.clone(),
            digest: desc.digest.to_string(),
            title: desc.title().unwrap_or_default().to_string(),
            media_type: desc.media_type.clone(),
        }
    }

    /// Render the six-line block followed by a blank separator.
    fn render(&self) -> String {
        format!(
            "{}\n      {}\n      {}\n      {}\n      {}\n      {}\n\n",
            self.target_ref,
            self.resolved_ref,
            self.registry,
            self.digest,
            self.title,
            self.media_type,
        )
    }
}

/// Accumulates lock entries for one pull and appends them on commit.
#[derive(Debug, Default)]
pub struct LockRecorder {
    path: Option<PathBuf>,
    entries: Vec<LockEntry>,
}

impl LockRecorder {
    /// Create a recorder appending to the given lock file.
    pub fn new(path: PathBuf) -> Self {
        LockRecorder {
            path: Some(path),
            entries: Vec::new(),
        }
    }

    /// Create a disabled recorder: records nothing, commit is a no-op.
    pub fn disabled() -> Self {
        LockRecorder::default()
    }

    /// Whether recording is enabled.
    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Entries recorded so far, in copy order.
    pub fn entries(&self) -> &[LockEntry] {
        &self.entries
    }

    /// Record one entry.
    pub fn record(&mut self, entry: LockEntry) {
        if self.path.is_some() {
            self.entries.push(entry);
        }
    }

    /// Append all recorded entries to the lock file.
    ///
    /// The file is created if absent and opened in append mode; an exclusive
    /// advisory lock keeps concurrent processes from interleaving partial
    /// blocks. Recorded entries are drained so a recorder reused across
    /// pulls never double-commits.
    pub fn commit(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if self.entries.is_empty() {
            return Ok(());
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.lock_exclusive()?;
        let mut block = String::new();
        for entry in self.entries.drain(..) {
            block.push_str(&entry.render());
        }
        let result = file.write_all(block.as_bytes()).and_then(|()| file.flush());
        let _ = fs2::FileExt::unlock(&file);
        result?;
        tracing::debug!(path = %path.display(), "lock file updated");
        Ok(())
    }
}
