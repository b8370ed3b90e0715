//! Build engine client.
//!
//! The engine is an external daemon that executes image builds and reports
//! newline-framed JSON progress. [`BuildEngine`] is the boundary the
//! orchestrator drives; [`DockerEngine`] implements it against the Docker
//! Engine HTTP API.

use async_trait::async_trait;
use serde::Deserialize;

use bakery_core::config::EngineConfig;
use bakery_core::error::{BakeryError, Result};

use crate::archive::ArchiveStream;
use crate::stream::{json_messages, MessageStream};

/// Engine-side record of a stored image.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageSummary {
    /// Engine-assigned image id.
    #[serde(rename = "Id")]
    pub id: String,
}

/// External build engine boundary.
#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// Look up an image by exact reference or artifact id.
    ///
    /// "Not found" is a normal negative result (`Ok(None)`); any other
    /// engine failure is surfaced as an error so it is never mistaken for a
    /// cache miss.
    async fn inspect_image(&self, reference: &str) -> Result<Option<ImageSummary>>;

    /// Submit a build with the packaged context as the request body, tagging
    /// the output with `tags`. Returns the engine's progress message stream.
    async fn build_image(&self, context: ArchiveStream, tags: &[String]) -> Result<MessageStream>;
}

/// Docker Engine HTTP API client.
///
/// Built once from an [`EngineConfig`] and reused across cycles; connections
/// are pooled by the underlying client.
pub struct DockerEngine {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
}

impl DockerEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        }
    }

    /// Construct from `DOCKER_HOST`, falling back to the default endpoint.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(&EngineConfig::from_env()?))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}{}", self.endpoint, self.api_version, path)
    }
}

#[async_trait]
impl BuildEngine for DockerEngine {
    async fn inspect_image(&self, reference: &str) -> Result<Option<ImageSummary>> {
        let url = self.url(&format!("/images/{reference}/json"));

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| BakeryError::EngineUnavailable {
                    operation: "image inspect".to_string(),
                    message: e.to_string(),
                })?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let summary =
                    response
                        .json::<ImageSummary>()
                        .await
                        .map_err(|e| BakeryError::EngineUnavailable {
                            operation: "image inspect".to_string(),
                            message: format!("malformed inspect response: {e}"),
                        })?;
                Ok(Some(summary))
            }
            status => Err(BakeryError::EngineUnavailable {
                operation: "image inspect".to_string(),
                message: format!("{reference}: engine returned {status}"),
            }),
        }
    }

    async fn build_image(&self, context: ArchiveStream, tags: &[String]) -> Result<MessageStream> {
        let url = self.url("/build");
        let query: Vec<(&str, &str)> = tags.iter().map(|t| ("t", t.as_str())).collect();

        tracing::debug!(tags = ?tags, "Submitting build");

        let response = self
            .client
            .post(&url)
            .query(&query)
            .header(reqwest::header::CONTENT_TYPE, "application/x-tar")
            .body(reqwest::Body::wrap_stream(context))
            .send()
            .await
            .map_err(|e| BakeryError::EngineUnavailable {
                operation: "build submit".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BakeryError::EngineUnavailable {
                operation: "build submit".to_string(),
                message: format!("engine returned {status}: {}", message.trim()),
            });
        }

        Ok(json_messages(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_endpoint_and_version() {
        let engine = DockerEngine::new(&EngineConfig {
            endpoint: "http://localhost:2375/".to_string(),
            api_version: "v1.43".to_string(),
        });
        assert_eq!(
            engine.url("/images/app:f1/json"),
            "http://localhost:2375/v1.43/images/app:f1/json"
        );
    }

    #[test]
    fn test_image_summary_deserializes_engine_shape() {
        let summary: ImageSummary =
            serde_json::from_str(r#"{"Id":"sha256:deadbeef","RepoTags":["app:f1"]}"#).unwrap();
        assert_eq!(summary.id, "sha256:deadbeef");
    }
}
