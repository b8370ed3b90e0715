//! Source tree fingerprinting.
//!
//! Derives a stable content identifier for a source directory from its
//! version-control history. Identical content yields the identical
//! fingerprint, so the fingerprint doubles as the build cache key.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use bakery_core::error::{BakeryError, Result};

/// Stable content-derived identifier for a source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derives fingerprints for directories inside a tracked source checkout.
///
/// Read-only: providers never mutate the source location.
#[async_trait]
pub trait FingerprintProvider: Send + Sync {
    /// Fingerprint `path` (relative to `source_root`) at the current head
    /// revision.
    ///
    /// Errors are terminal for the calling cycle; they indicate caller
    /// misconfiguration, not transient failure.
    async fn fingerprint(&self, source_root: &Path, path: &str) -> Result<Fingerprint>;
}

/// Fingerprints a directory as the git tree object id of `path` at `HEAD`.
///
/// The tree id is a digest of the directory's tracked content, so it is
/// stable across clones, checkouts, and rebuilds of the working copy, and
/// changes whenever any tracked file under the directory changes.
pub struct GitTreeFingerprint;

impl GitTreeFingerprint {
    async fn rev_parse(root: &Path, args: &[&str]) -> std::result::Result<String, String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(root)
            .arg("rev-parse")
            .args(args)
            .output()
            .await
            .map_err(|e| format!("failed to run git: {e}"))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

#[async_trait]
impl FingerprintProvider for GitTreeFingerprint {
    async fn fingerprint(&self, source_root: &Path, path: &str) -> Result<Fingerprint> {
        Self::rev_parse(source_root, &["--git-dir"])
            .await
            .map_err(|message| BakeryError::NotOpenable {
                root: source_root.display().to_string(),
                message,
            })?;

        Self::rev_parse(source_root, &["--verify", "HEAD"])
            .await
            .map_err(|message| BakeryError::NoHead {
                root: source_root.display().to_string(),
                message,
            })?;

        let spec = format!("HEAD:{path}");
        let id = Self::rev_parse(source_root, &["--verify", &spec])
            .await
            .map_err(|message| BakeryError::EntryNotFound {
                path: path.to_string(),
                message,
            })?;

        tracing::debug!(path = %path, fingerprint = %id, "Resolved source fingerprint");
        Ok(Fingerprint::new(id))
    }
}
