// Google Generative Language API transport
// Shared HTTP plumbing for the embedding and chat-completion clients


use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::{ApiKey, Config};

const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Blocking JSON client for `generativelanguage.googleapis.com`.
///
/// Requests are sent once; failures are returned to the caller untouched
/// apart from added context.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: Url,
    api_key: ApiKey,
    agent: ureq::Agent,
}

/// Error envelope returned by the API on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

impl Content {
    #[inline]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }

    #[inline]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            ..Self::text(text)
        }
    }
}

impl GeminiClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .gemini_url()
            .context("Failed to generate Gemini URL from config")?;

        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            agent: Self::build_agent(Duration::from_secs(config.gemini.timeout_seconds)),
        })
    }

    fn build_agent(timeout: Duration) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into()
    }

    /// URL of a model method, e.g. `v1beta/models/embedding-001:embedContent`
    #[inline]
    pub fn model_url(&self, model: &str, method: &str) -> Result<Url> {
        self.base_url
            .join(&format!("{}/{}:{}", API_VERSION, model_path(model), method))
            .with_context(|| format!("Failed to build URL for {}:{}", model, method))
    }

    /// POST `body` as JSON to a model method and decode the JSON reply
    #[inline]
    pub fn post<B, R>(&self, model: &str, method: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let url = self.model_url(model, method)?;
        let request_json =
            serde_json::to_string(body).context("Failed to serialize Gemini request")?;

        debug!("POST {} ({} bytes)", url, request_json.len());

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, self.api_key.expose())
            .send(&request_json)
            .with_context(|| format!("Request to {} failed", url.path()))?;

        let status = response.status();
        let response_text = response
            .body_mut()
            .read_to_string()
            .context("Failed to read Gemini response body")?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&response_text)
                .map(|e| describe_error(&e.error))
                .unwrap_or_else(|_| response_text.trim().to_string());
            warn!("Gemini returned HTTP {} for {}: {}", status.as_u16(), url.path(), detail);
            return Err(anyhow::anyhow!("HTTP {}: {}", status.as_u16(), detail));
        }

        serde_json::from_str(&response_text)
            .with_context(|| format!("Failed to parse response from {}", url.path()))
    }
}

/// Model resource name; bare ids get the `models/` prefix
#[inline]
pub fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

fn describe_error(error: &ErrorDetail) -> String {
    if error.status.is_empty() {
        error.message.clone()
    } else {
        format!("{} ({})", error.message, error.status)
    }
}
