use serde::{Deserialize, Serialize};

use crate::error::{BakeryError, Result};

/// Default engine endpoint when `DOCKER_HOST` is unset.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:2375";

/// Engine API version prefix used for all requests.
pub const DEFAULT_API_VERSION: &str = "v1.43";

/// Build engine connection configuration.
///
/// Constructed once per process and handed to the engine client explicitly;
/// nothing in the workspace builds a client from ambient environment on the
/// fly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine HTTP endpoint (e.g., "http://localhost:2375")
    pub endpoint: String,

    /// API version path prefix (e.g., "v1.43")
    pub api_version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl EngineConfig {
    /// Build a configuration from the environment.
    ///
    /// Honors `DOCKER_HOST` when set; `tcp://` schemes are rewritten to
    /// `http://`. Falls back to [`DEFAULT_ENDPOINT`] when unset.
    pub fn from_env() -> Result<Self> {
        let endpoint = match std::env::var("DOCKER_HOST") {
            Ok(raw) => endpoint_from_docker_host(&raw)?,
            Err(_) => DEFAULT_ENDPOINT.to_string(),
        };

        Ok(Self {
            endpoint,
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }
}

/// Translate a `DOCKER_HOST` value into an HTTP endpoint.
fn endpoint_from_docker_host(raw: &str) -> Result<String> {
    let raw = raw.trim().trim_end_matches('/');
    if raw.is_empty() {
        return Ok(DEFAULT_ENDPOINT.to_string());
    }

    if let Some(rest) = raw.strip_prefix("tcp://") {
        return Ok(format!("http://{rest}"));
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Ok(raw.to_string());
    }

    Err(BakeryError::ConfigError(format!(
        "unsupported DOCKER_HOST '{raw}' (expected tcp://, http:// or https://)"
    )))
}
