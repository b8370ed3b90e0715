//! The content-addressed build cycle.
//!
//! One cycle per invocation: fingerprint the source, resolve the reference,
//! reuse the image when the engine already has it, otherwise package, build,
//! decode, and confirm. The cycle is a strictly ordered, blocking pipeline;
//! it owns its build request and decoder exclusively and holds no state
//! between invocations, so re-running it with unchanged content is free of
//! side effects beyond the first successful run.

use std::path::PathBuf;
use std::sync::Arc;

use bakery_core::error::{BakeryError, Result};

use crate::archive::SourcePackager;
use crate::engine::BuildEngine;
use crate::fingerprint::FingerprintProvider;
use crate::reference::ImageReference;
use crate::stream;

/// What to build: a logical image name plus the source location.
#[derive(Debug, Clone)]
pub struct BuildSpec {
    /// Logical image name; build results are tagged `name:fingerprint`.
    pub image_name: String,

    /// Root of the history-tracked source checkout.
    pub source_root: PathBuf,

    /// Directory to build, relative to `source_root`. Doubles as the build
    /// context uploaded to the engine.
    pub source_dir: String,
}

impl BuildSpec {
    fn context_dir(&self) -> PathBuf {
        self.source_root.join(&self.source_dir)
    }
}

/// Committed result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The reference already named a built image; nothing was submitted.
    AlreadyExists { reference: String },

    /// A build ran and the engine confirmed the artifact.
    Built {
        reference: String,
        artifact_id: String,
    },
}

impl BuildOutcome {
    /// The durable image reference to commit to caller-visible state.
    pub fn reference(&self) -> &str {
        match self {
            BuildOutcome::AlreadyExists { reference } => reference,
            BuildOutcome::Built { reference, .. } => reference,
        }
    }
}

/// Drives build cycles against an engine, a fingerprint provider, and a
/// packager.
pub struct Orchestrator {
    engine: Arc<dyn BuildEngine>,
    fingerprints: Arc<dyn FingerprintProvider>,
    packager: Arc<dyn SourcePackager>,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn BuildEngine>,
        fingerprints: Arc<dyn FingerprintProvider>,
        packager: Arc<dyn SourcePackager>,
    ) -> Self {
        Self {
            engine,
            fingerprints,
            packager,
        }
    }

    /// Drive one full cycle for `spec`.
    ///
    /// Errors leave nothing committed: the reference only becomes the
    /// durable identity once the confirming inspection succeeds.
    pub async fn converge(&self, spec: &BuildSpec) -> Result<BuildOutcome> {
        let fingerprint = self
            .fingerprints
            .fingerprint(&spec.source_root, &spec.source_dir)
            .await?;
        let reference = ImageReference::resolve(&spec.image_name, fingerprint.as_str())?;

        if self.engine.inspect_image(reference.as_str()).await?.is_some() {
            tracing::info!(reference = %reference, "Image already built, reusing");
            return Ok(BuildOutcome::AlreadyExists {
                reference: reference.as_str().to_string(),
            });
        }

        let context_dir = spec.context_dir();
        tracing::info!(
            reference = %reference,
            context = %context_dir.display(),
            "Image not found, building"
        );

        let archive = self.packager.pack(&context_dir)?;
        let tags = vec![reference.as_str().to_string()];

        // A packaging failure after handoff aborts the upload mid-request,
        // so engine-availability errors on this path are reattributed to the
        // recorded packaging fault before they surface.
        let messages = self
            .engine
            .build_image(archive.stream, &tags)
            .await
            .map_err(|e| archive.fault.classify(e, &context_dir))?;

        let artifact_id = stream::decode(reference.as_str(), messages)
            .await
            .map_err(|e| archive.fault.classify(e, &context_dir))?;

        // A terminal success message is not an engine-level commit; confirm
        // the artifact is actually registered before committing the
        // reference.
        if self.engine.inspect_image(&artifact_id).await?.is_none() {
            return Err(BakeryError::NoArtifactProduced {
                reference: reference.as_str().to_string(),
            });
        }

        tracing::info!(reference = %reference, artifact = %artifact_id, "Build committed");
        Ok(BuildOutcome::Built {
            reference: reference.as_str().to_string(),
            artifact_id,
        })
    }
}
