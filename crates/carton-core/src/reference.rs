//! Registry reference parsing.
//!
//! References name a repository within a registry, optionally pinned to a
//! tag (`host/repo:tag`) or a digest (`host/repo@sha256:<hex>`). The first
//! path segment is the registry host; the rest is the repository.

use std::fmt;

use crate::digest::Digest;
use crate::error::{CoreError, Result};

/// A parsed registry reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Registry host (may include a port).
    pub registry: String,
    /// Repository path within the registry.
    pub repository: String,
    /// Tag, when referenced by tag.
    pub tag: Option<String>,
    /// Digest, when referenced by digest.
    pub digest: Option<Digest>,
}

impl Reference {
    /// Parse a reference string.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = |detail: &str| CoreError::InvalidReference {
            value: value.to_string(),
            detail: detail.to_string(),
        };

        let (rest, digest) = match value.split_once('@') {
            Some((rest, digest_str)) => (rest, Some(Digest::parse(digest_str)?)),
            None => (value, None),
        };

        // Only the part after the last '/' may carry a tag; a ':' before that
        // belongs to the registry port.
        let name_start = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (rest, tag) = match rest[name_start..].split_once(':') {
            Some((name, tag)) => {
                if tag.is_empty() {
                    return Err(invalid("empty tag"));
                }
                (&rest[..name_start + name.len()], Some(tag.to_string()))
            }
            None => (rest, None),
        };

        let Some((registry, repository)) = rest.split_once('/') else {
            return Err(invalid("expected '<registry>/<repository>'"));
        };
        if registry.is_empty() {
            return Err(invalid("empty registry host"));
        }
        if repository.is_empty() {
            return Err(invalid("empty repository"));
        }

        Ok(Reference {
            registry: registry.to_string(),
            repository: repository.to_string(),
            tag,
            digest,
        })
    }

    /// The tag or digest string this reference resolves through.
    ///
    /// Empty when the reference carries neither (such a reference names a
    /// repository but cannot be pulled).
    pub fn reference(&self) -> String {
        if let Some(tag) = &self.tag {
            tag.clone()
        } else if let Some(digest) = &self.digest {
            digest.to_string()
        } else {
            String::new()
        }
    }

    /// Whether this reference can be resolved to a root descriptor.
    pub fn is_resolvable(&self) -> bool {
        self.tag.is_some() || self.digest.is_some()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tagged() {
        let r = Reference::parse("localhost:5000/hello:latest").unwrap();
        assert_eq!(r.registry, "localhost:5000");
        assert_eq!(r.repository, "hello");
        assert_eq!(r.tag.as_deref(), Some("latest"));
        assert!(r.digest.is_none());
        assert_eq!(r.reference(), "latest");
    }

    #[test]
    fn parse_digest_reference() {
        let digest = Digest::from_bytes(b"root");
        let raw = format!("registry.example.com/ns/app@{digest}");
        let r = Reference::parse(&raw).unwrap();
        assert_eq!(r.repository, "ns/app");
        assert_eq!(r.digest.as_ref(), Some(&digest));
        assert_eq!(r.reference(), digest.to_string());
    }

    #[test]
    fn parse_untagged() {
        let r = Reference::parse("ghcr.io/devcontainers/features").unwrap();
        assert_eq!(r.registry, "ghcr.io");
        assert_eq!(r.repository, "devcontainers/features");
        assert!(!r.is_resolvable());
        assert_eq!(r.reference(), "");
    }

    #[test]
    fn port_is_not_a_tag() {
        let r = Reference::parse("localhost:5000/hello").unwrap();
        assert_eq!(r.registry, "localhost:5000");
        assert!(r.tag.is_none());
    }

    #[test]
    fn reject_missing_repository() {
        assert!(Reference::parse("justahost").is_err());
        assert!(Reference::parse("host/").is_err());
        assert!(Reference::parse("/repo").is_err());
    }

    #[test]
    fn reject_empty_tag() {
        assert!(Reference::parse("host/repo:").is_err());
    }

    #[test]
    fn reject_bad_digest() {
        assert!(Reference::parse("host/repo@sha256:short").is_err());
    }

    #[test]
    fn display_round_trip() {
        for raw in [
            "localhost:5000/hello:latest",
            "ghcr.io/devcontainers/features",
        ] {
            let r = Reference::parse(raw).unwrap();
            assert_eq!(r.to_string(), raw);
        }
    }
}
