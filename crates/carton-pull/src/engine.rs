//! The selective graph-copy engine.
//!
//! Walks a manifest DAG depth first from a resolved root, deciding node by
//! node which descriptors to fetch and materialize. Children are copied
//! before their parent completes, so a manifest is never reported copied
//! while it references missing content. Each unique digest is fetched and
//! written at most once regardless of DAG fan-in.
//!
//! Successor filtering applies three rules in order: a successor matching
//! the required media type marks the policy gate satisfied; a successor
//! matching the config-override media type has its title redirected to the
//! override path; an untitled successor with no successors of its own is
//! dropped (it would otherwise produce a ghost output). The gate itself is
//! evaluated once, after the whole traversal; a required type appearing
//! only in the last-visited branch still satisfies it.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use carton_core::{Descriptor, Digest, Reference};

use crate::error::{PullError, Result};
use crate::lock::{LockEntry, LockRecorder};
use crate::observer::PullObserver;
use crate::sink::FileSink;
use crate::store::ArtifactStore;

/// Redirect for the embedded configuration blob.
#[derive(Debug, Clone)]
pub struct ConfigOverride {
    /// Path the config blob should be written to.
    pub path: String,
    /// Media type identifying the config blob.
    pub media_type: String,
}

/// Policy governing one pull.
#[derive(Debug, Clone)]
pub struct PullPolicy {
    /// Media type that must appear somewhere in the tree; `None` disables
    /// the gate.
    pub required_media_type: Option<String>,
    /// Directory files are written under.
    pub output_root: PathBuf,
    /// Permit title annotations to resolve outside the output root.
    pub allow_path_escape: bool,
    /// Fail on existing destination files instead of replacing them.
    pub disallow_overwrite: bool,
    /// Optional redirect for the manifest config blob.
    pub config_override: Option<ConfigOverride>,
}

impl Default for PullPolicy {
    fn default() -> Self {
        PullPolicy {
            required_media_type: None,
            output_root: PathBuf::from("."),
            allow_path_escape: false,
            disallow_overwrite: false,
            config_override: None,
        }
    }
}

/// Cooperative cancellation signal, checked at every node.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation. The walk aborts at the next node boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The result of a successful pull.
#[derive(Debug, Clone)]
pub struct PullOutcome {
    /// The resolved root descriptor.
    pub root: Descriptor,
    /// Number of named files materialized. Zero means the artifact was
    /// empty, which is a notice for callers rather than an error.
    pub files_written: usize,
}

/// Per-invocation traversal bookkeeping.
///
/// Created at the start of one pull and discarded at its end; never shared
/// across invocations. The required-media-type flag lives here explicitly
/// so the gate's after-full-traversal semantics are visible in one place.
struct TraversalState {
    visited: HashSet<Digest>,
    required_seen: bool,
    materialized: usize,
}

impl TraversalState {
    fn new() -> Self {
        TraversalState {
            visited: HashSet::new(),
            required_seen: false,
            materialized: 0,
        }
    }
}

/// Resolve a reference and copy its graph to the destination.
///
/// On success returns the root descriptor and the count of named files
/// written, and commits any recorded lock entries. On failure nothing is
/// committed and already-written files are left in place; callers needing
/// atomicity must pull into a staging directory and rename.
pub fn pull(
    store: &impl ArtifactStore,
    reference: &Reference,
    policy: &PullPolicy,
    observer: &dyn PullObserver,
    recorder: &mut LockRecorder,
    cancel: &CancelToken,
) -> Result<PullOutcome> {
    let root = store.resolve(reference)?;
    tracing::info!(reference = %reference, digest = %root.digest, "pulling");

    let sink = FileSink::new(policy.output_root.clone())
        .allow_path_escape(policy.allow_path_escape)
        .disallow_overwrite(policy.disallow_overwrite);

    let mut state = TraversalState::new();
    copy_node(
        store, &root, policy, &sink, observer, recorder, cancel, reference, &mut state,
    )?;

    // The gate is meaningful only once there are no more nodes to expand: a
    // branch visited late may be the one that satisfies it.
    if let Some(required) = &policy.required_media_type {
        if !state.required_seen {
            return Err(PullError::PolicyViolation {
                media_type: required.clone(),
            });
        }
    }

    recorder.commit()?;

    Ok(PullOutcome {
        root,
        files_written: state.materialized,
    })
}

/// Copy one node: filter successors, recurse, then fetch and write.
#[allow(clippy::too_many_arguments)]
fn copy_node(
    store: &impl ArtifactStore,
    desc: &Descriptor,
    policy: &PullPolicy,
    sink: &FileSink,
    observer: &dyn PullObserver,
    recorder: &mut LockRecorder,
    cancel: &CancelToken,
    reference: &Reference,
    state: &mut TraversalState,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(PullError::Cancelled);
    }
    // A digest already copied is never re-fetched, re-written, or given a
    // second lock entry, no matter how many parents share it.
    if !state.visited.insert(desc.digest.clone()) {
        tracing::trace!(digest = %desc.digest, "already copied, skipping");
        return Ok(());
    }

    let successors = store.successors(desc)?;
    let kept = filter_successors(store, successors, policy, state)?;

    // Children before parent: the parent is complete only once everything
    // it references is durable.
    for successor in &kept {
        copy_node(
            store, successor, policy, sink, observer, recorder, cancel, reference, state,
        )?;
    }

    observer.before_fetch(desc);
    let data = store.fetch(desc)?;

    if sink.write(desc, &data)?.is_some() {
        state.materialized += 1;
        recorder.record(LockEntry::new(reference, desc));
        observer.after_write(desc);
    }

    Ok(())
}

/// Apply the successor-selection policy to one node's successor list.
fn filter_successors(
    store: &impl ArtifactStore,
    successors: Vec<Descriptor>,
    policy: &PullPolicy,
    state: &mut TraversalState,
) -> Result<Vec<Descriptor>> {
    let mut kept = Vec::with_capacity(successors.len());

    for mut successor in successors {
        if let Some(required) = &policy.required_media_type {
            if successor.media_type == *required {
                state.required_seen = true;
            }
        }

        if let Some(redirect) = &policy.config_override {
            if successor.media_type == redirect.media_type {
                successor.set_title(redirect.path.clone());
                kept.push(successor);
                continue;
            }
        }

        if successor.title().is_none() {
            // Probe one level: an untitled node with no successors carries
            // no payload worth walking into. Probe results are not cached;
            // probes are read-only and idempotent, so a shared empty node
            // may be probed more than once.
            if store.successors(&successor)?.is_empty() {
                tracing::trace!(digest = %successor.digest, "pruning empty untitled node");
                continue;
            }
        }

        kept.push(successor);
    }

    Ok(kept)
}
