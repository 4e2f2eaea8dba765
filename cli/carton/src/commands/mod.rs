//! CLI command implementations.

pub mod metadata;
pub mod pull;
pub mod resolve;
pub mod tags;
