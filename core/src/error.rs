use thiserror::Error;

/// Bakery error types
///
/// Every variant carries enough context (operation, identifiers) to be
/// surfaced upward without re-deriving state. Nothing here retries; retry
/// policy belongs to the invoking lifecycle framework.
#[derive(Error, Debug)]
pub enum BakeryError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Image name or fingerprint would not form a usable reference
    #[error("Invalid image identity: {0}")]
    InvalidIdentity(String),

    /// Source root is not a history-tracked location
    #[error("Source history not openable at {root}: {message}")]
    NotOpenable { root: String, message: String },

    /// History has no current head revision
    #[error("No head revision in {root}: {message}")]
    NoHead { root: String, message: String },

    /// Path does not resolve to an entry at the current head revision
    #[error("Source entry not found: {path} - {message}")]
    EntryNotFound { path: String, message: String },

    /// Local filesystem failure while packaging the build context
    #[error("Packaging failed for {dir}: {message}")]
    PackagingError { dir: String, message: String },

    /// Engine unreachable or responded outside its contract
    #[error("Build engine unavailable during {operation}: {message}")]
    EngineUnavailable { operation: String, message: String },

    /// The build tool reported a failure inside the progress stream
    #[error("Build failed{}: {message}", match .code { Some(c) => format!(" (code {c})"), None => String::new() })]
    BuildStreamError { code: Option<i64>, message: String },

    /// Stream ended without a confirmable terminal artifact
    #[error("No artifact produced for {reference}")]
    NoArtifactProduced { reference: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for BakeryError {
    fn from(err: serde_json::Error) -> Self {
        BakeryError::SerializationError(err.to_string())
    }
}

/// Result type alias for Bakery operations
pub type Result<T> = std::result::Result<T, BakeryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_identity_display() {
        let error = BakeryError::InvalidIdentity("image name is empty".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid image identity: image name is empty"
        );
    }

    #[test]
    fn test_not_openable_display() {
        let error = BakeryError::NotOpenable {
            root: "/tmp/src".to_string(),
            message: "not a git repository".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Source history not openable at /tmp/src: not a git repository"
        );
    }

    #[test]
    fn test_engine_unavailable_display() {
        let error = BakeryError::EngineUnavailable {
            operation: "image inspect".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Build engine unavailable during image inspect: connection refused"
        );
    }

    #[test]
    fn test_build_stream_display_with_code() {
        let error = BakeryError::BuildStreamError {
            code: Some(1),
            message: "The command '/bin/sh -c make' returned a non-zero code: 2".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Build failed (code 1): The command '/bin/sh -c make' returned a non-zero code: 2"
        );
    }

    #[test]
    fn test_build_stream_display_without_code() {
        let error = BakeryError::BuildStreamError {
            code: None,
            message: "build failed".to_string(),
        };
        assert_eq!(error.to_string(), "Build failed: build failed");
    }

    #[test]
    fn test_no_artifact_produced_display() {
        let error = BakeryError::NoArtifactProduced {
            reference: "app:f1".to_string(),
        };
        assert_eq!(error.to_string(), "No artifact produced for app:f1");
    }

    #[test]
    fn test_packaging_display() {
        let error = BakeryError::PackagingError {
            dir: "/tmp/ctx".to_string(),
            message: "not a directory".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Packaging failed for /tmp/ctx: not a directory"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: BakeryError = io_error.into();
        assert!(matches!(error, BakeryError::IoError(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{ invalid json }");
        let error: BakeryError = result.unwrap_err().into();
        assert!(matches!(error, BakeryError::SerializationError(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        assert_eq!(returns_ok().unwrap(), 42);
    }
}
