//! Pull progress hooks.
//!
//! The engine notifies an observer before each fetch and after each named
//! file is durably written. Hooks are telemetry only; the engine behaves
//! identically with the no-op implementation.

use carton_core::Descriptor;

/// Side-channel notifications emitted during a pull.
pub trait PullObserver {
    /// Called before a node's bytes are fetched.
    fn before_fetch(&self, _desc: &Descriptor) {}

    /// Called after a named file has been written to the destination.
    ///
    /// Never called for untitled descriptors.
    fn after_write(&self, _desc: &Descriptor) {}
}

/// Observer that does nothing.
pub struct NoopObserver;

impl PullObserver for NoopObserver {}
