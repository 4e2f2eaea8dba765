//! Data model for content-addressable artifact registries.
//!
//! Defines the vocabulary the rest of carton speaks: content digests,
//! descriptors (content-addressed pointers with media type, size, and
//! annotations), manifest/index decoding into successor lists, and
//! registry reference parsing.
//!
//! Everything here is pure data with no I/O. Stores, caches, and the copy
//! engine live in `carton-pull`.

pub mod descriptor;
pub mod digest;
pub mod error;
pub mod manifest;
pub mod reference;

// Re-exports for convenience.
pub use descriptor::{media_types, Descriptor, ANNOTATION_TITLE};
pub use digest::Digest;
pub use error::{CoreError, Result};
pub use manifest::{successors, ImageIndex, ImageManifest};
pub use reference::Reference;
