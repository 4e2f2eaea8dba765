//! Content digests.
//!
//! Every blob and manifest is addressed by the SHA-256 of its bytes, written
//! in the canonical `sha256:<64 lowercase hex>` form. Two descriptors with
//! equal digests denote byte-identical content.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// A content digest in `sha256:<hex>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Compute the digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let hex: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        Digest(format!("sha256:{hex}"))
    }

    /// Parse and validate a digest string.
    pub fn parse(value: &str) -> crate::Result<Self> {
        let Some((algorithm, hex)) = value.split_once(':') else {
            return Err(crate::CoreError::InvalidDigest {
                value: value.to_string(),
                detail: "missing ':' separator".to_string(),
            });
        };
        if algorithm != "sha256" {
            return Err(crate::CoreError::InvalidDigest {
                value: value.to_string(),
                detail: format!("unsupported algorithm '{algorithm}'"),
            });
        }
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        {
            return Err(crate::CoreError::InvalidDigest {
                value: value.to_string(),
                detail: "expected 64 lowercase hex characters".to_string(),
            });
        }
        Ok(Digest(value.to_string()))
    }

    /// The algorithm part (`sha256`).
    pub fn algorithm(&self) -> &str {
        self.0.split_once(':').map(|(a, _)| a).unwrap_or("")
    }

    /// The hex-encoded hash part.
    pub fn hex(&self) -> &str {
        self.0.split_once(':').map(|(_, h)| h).unwrap_or("")
    }

    /// The full `algorithm:hex` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify that the given bytes hash to this digest.
    pub fn verify(&self, data: &[u8]) -> bool {
        Digest::from_bytes(data) == *self
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
