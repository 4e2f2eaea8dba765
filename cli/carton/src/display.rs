//! Human-readable pull progress.

use carton_core::Descriptor;
use carton_pull::PullObserver;

/// Observer printing one status line per fetch and per downloaded file.
pub struct StatusDisplay;

impl PullObserver for StatusDisplay {
    fn before_fetch(&self, desc: &Descriptor) {
        println!("Downloading {}", short_digest(desc));
    }

    fn after_write(&self, desc: &Descriptor) {
        println!("Downloaded {} {}", short_digest(desc), desc.title().unwrap_or_default());
    }
}

/// First 12 hex characters of a descriptor's digest.
pub fn short_digest(desc: &Descriptor) -> &str {
    let hex = desc.digest.hex();
    &hex[..hex.len().min(12)]
}
