//! Selective graph-copy engine for content-addressable registries.
//!
//! Resolves a reference to a root manifest, walks the manifest DAG depth
//! first, and materializes named blobs to local storage, with an optional
//! digest-keyed cache between the store and the destination and an
//! append-only lock file recording what was written.
//!
//! # Architecture
//!
//! - [`store`]: the `ArtifactStore` seam (resolve / fetch / successors) and
//!   a filesystem-backed registry for development and testing
//! - [`cache`]: digest-keyed blob cache and the caching store overlay
//! - [`engine`]: the traversal: successor filtering, required-media-type
//!   gate, per-node hooks
//! - [`sink`]: destination file writes with path containment and overwrite
//!   policy
//! - [`lock`]: append-only audit trail of materialized files

pub mod cache;
pub mod engine;
pub mod error;
pub mod lock;
pub mod observer;
pub mod sink;
pub mod store;

// Re-exports for convenience.
pub use cache::{BlobCache, CachingStore};
pub use engine::{pull, CancelToken, ConfigOverride, PullOutcome, PullPolicy};
pub use error::{PullError, Result};
pub use lock::{LockEntry, LockRecorder};
pub use observer::{NoopObserver, PullObserver};
pub use sink::FileSink;
pub use store::{ArtifactStore, LocalRegistry};
