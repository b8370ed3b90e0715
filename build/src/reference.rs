//! Image identity resolution.
//!
//! An image reference is the composite identity `name:fingerprint` naming a
//! build result. The fingerprint is the cache key and the reference is the
//! cache slot, so this type is the single source of truth for "is this
//! content already built". References are constructed only here; nothing
//! else in the workspace hand-assembles one.

use bakery_core::error::{BakeryError, Result};

/// A resolved image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    reference: String,
}

impl ImageReference {
    /// Compose a reference from a logical image name and a content
    /// fingerprint.
    ///
    /// Rejects empty parts: an empty fingerprint would silently alias every
    /// source tree under a single tag, and an empty name is not a taggable
    /// image.
    pub fn resolve(name: &str, fingerprint: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(BakeryError::InvalidIdentity(
                "image name is empty".to_string(),
            ));
        }
        if fingerprint.is_empty() {
            return Err(BakeryError::InvalidIdentity(
                "fingerprint is empty".to_string(),
            ));
        }

        Ok(Self {
            reference: format!("{name}:{fingerprint}"),
        })
    }

    /// The full reference string.
    pub fn as_str(&self) -> &str {
        &self.reference
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reference)
    }
}
