//! Bakery Build - content-addressed container image builds.
//!
//! Given a history-tracked source directory, derives a stable fingerprint,
//! resolves it into an image reference (`name:fingerprint`), and builds the
//! image only when that reference is not already present on the engine.
//! Repeated cycles over unchanged content never resubmit a build.

pub mod archive;
pub mod cycle;
pub mod engine;
pub mod fingerprint;
pub mod lifecycle;
pub mod reference;
pub mod stream;

// Re-export commonly used types
pub use archive::{ArchiveStream, PackagingFault, PackedArchive, SourcePackager, TarPackager};
pub use cycle::{BuildOutcome, BuildSpec, Orchestrator};
pub use engine::{BuildEngine, DockerEngine, ImageSummary};
pub use fingerprint::{Fingerprint, FingerprintProvider, GitTreeFingerprint};
pub use lifecycle::Trigger;
pub use reference::ImageReference;
pub use stream::{BuildMessage, MessageStream};
