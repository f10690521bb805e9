//! Asynchronous video generation service client.

use crate::config::GenerationConfig;
use async_trait::async_trait;
use jobreel_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "generation";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub duration_seconds: u32,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationFailure {
    pub message: String,
}

/// State of a submitted generation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationStatus {
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<GenerationFailure>,
    #[serde(default)]
    pub video_uri: Option<String>,
}

/// A long-running video generation backend.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Start a generation, returning its operation id.
    async fn submit(&self, request: &GenerationRequest) -> Result<String>;

    async fn status(&self, operation_id: &str) -> Result<GenerationStatus>;

    /// Download produced media to `dest`, returning the byte count.
    async fn download(&self, uri: &str, dest: &Path) -> Result<u64>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

/// HTTP implementation of [`VideoGenerator`].
///
/// - `POST {base}/generations` with a [`GenerationRequest`] returns `{id}`.
/// - `GET {base}/generations/{id}` returns a [`GenerationStatus`].
/// - `GET {video_uri}` returns the media bytes.
#[derive(Debug, Clone)]
pub struct HttpVideoGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpVideoGenerator {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::external(SERVICE, format!("failed to build client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// `None` when no service is configured.
    pub fn from_config(config: &GenerationConfig) -> Result<Option<Self>> {
        match config.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => Self::new(
                url,
                config.resolved_api_key(),
                Duration::from_secs(config.request_timeout_secs),
            )
            .map(Some),
            None => Ok(None),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn checked(response: reqwest::Result<reqwest::Response>) -> Result<reqwest::Response> {
        let response =
            response.map_err(|e| Error::external(SERVICE, format!("request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::external(
                SERVICE,
                format!("HTTP {}: {}", status, body.chars().take(300).collect::<String>()),
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl VideoGenerator for HttpVideoGenerator {
    async fn submit(&self, request: &GenerationRequest) -> Result<String> {
        let url = format!("{}/generations", self.base_url);
        debug!(duration = request.duration_seconds, "Submitting generation");
        let response = Self::checked(self.authorized(self.client.post(&url).json(request)).send().await).await?;
        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| Error::external(SERVICE, format!("unreadable submit response: {}", e)))?;
        if body.id.trim().is_empty() {
            return Err(Error::validation("generation service returned an empty id"));
        }
        Ok(body.id)
    }

    async fn status(&self, operation_id: &str) -> Result<GenerationStatus> {
        let url = format!("{}/generations/{}", self.base_url, operation_id);
        let response = Self::checked(self.authorized(self.client.get(&url)).send().await).await?;
        response
            .json()
            .await
            .map_err(|e| Error::external(SERVICE, format!("unreadable status response: {}", e)))
    }

    async fn download(&self, uri: &str, dest: &Path) -> Result<u64> {
        let response = Self::checked(self.authorized(self.client.get(uri)).send().await).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::external(SERVICE, format!("download interrupted: {}", e)))?;
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}
