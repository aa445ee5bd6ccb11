use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::SessionConfig;
use crate::error::{GenError, Result};
use crate::request::JobRequest;
use crate::types::AspectRatio;

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Async HTTP client for an image-generation server.
///
/// Covers the catalog endpoints used to fill in a [`JobRequest`], the
/// streaming job submission, and the cancel/skip control calls.
///
/// # Example
/// ```no_run
/// use imagegen_stream::GenClient;
///
/// # async fn example() -> imagegen_stream::Result<()> {
/// let client = GenClient::new("http://localhost:5000");
/// let models = client.models().await?;
/// let ratios = client.aspect_ratios().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GenClient {
    http: Client,
    endpoint: String,
    control_timeout: Duration,
}

impl GenClient {
    /// Create a new client pointing at the given server.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: normalize(endpoint.into()),
            control_timeout: Duration::from_secs(5),
        }
    }

    /// Create a client from session configuration.
    ///
    /// The connect timeout is set on the underlying `reqwest::Client` so it
    /// bounds connection setup without bounding the stream body.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| GenError::Network {
                context: "Failed to build HTTP client".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            endpoint: normalize(config.base_url.clone()),
            control_timeout: config.control_timeout,
        })
    }

    /// Use a custom `reqwest::Client` (for connection pooling, timeouts, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Set the timeout used for catalog and control requests.
    pub fn with_control_timeout(mut self, timeout: Duration) -> Self {
        self.control_timeout = timeout;
        self
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn unreachable(&self, e: reqwest::Error) -> GenError {
        GenError::Network {
            context: format!(
                "Cannot connect to image server at {} \u{2014} is the service running?",
                self.endpoint
            ),
            source: e,
        }
    }

    // ── Catalog ─────────────────────────────────────────────────────

    /// List base/refiner model names (`GET /models`).
    pub async fn models(&self) -> Result<Vec<String>> {
        self.get_json("/models").await
    }

    /// List the output sizes the server supports (`GET /aspect-ratios`).
    pub async fn aspect_ratios(&self) -> Result<Vec<AspectRatio>> {
        self.get_json("/aspect-ratios").await
    }

    /// List every available style (`GET /styles`).
    pub async fn styles(&self) -> Result<Vec<String>> {
        self.get_json("/styles").await
    }

    /// List the styles selected by default (`GET /styles/default`).
    pub async fn default_styles(&self) -> Result<Vec<String>> {
        self.get_json("/styles/default").await
    }

    /// List available lora files (`GET /loras`).
    pub async fn loras(&self) -> Result<Vec<String>> {
        self.get_json("/loras").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.endpoint, path);
        let resp = self
            .http
            .get(&url)
            .timeout(self.control_timeout)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenError::Http { status, body });
        }

        let bytes = resp.bytes().await.map_err(|e| GenError::Network {
            context: format!("Failed to read {} response", path),
            source: e,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            GenError::InvalidResponse(format!("Unexpected {} response: {}", path, e))
        })
    }

    // ── Generation ──────────────────────────────────────────────────

    /// POST the job and return the response whose body carries the update stream.
    ///
    /// Fails with [`GenError::Http`] on a non-success status and
    /// [`GenError::NotStreaming`] when the server declares an empty body.
    pub async fn open_stream(&self, request: &JobRequest) -> Result<Response> {
        let url = format!("{}/image/gen", self.endpoint);
        let resp = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenError::Http { status, body });
        }

        if resp.content_length() == Some(0) {
            return Err(GenError::NotStreaming);
        }

        Ok(resp)
    }

    // ── Control ─────────────────────────────────────────────────────

    /// Ask the server to cancel the running job (`GET /image/gen/cancel`).
    pub async fn cancel(&self) -> Result<()> {
        self.signal("/image/gen/cancel").await
    }

    /// Ask the server to skip the image currently being generated
    /// (`GET /image/gen/skip`).
    pub async fn skip(&self) -> Result<()> {
        self.signal("/image/gen/skip").await
    }

    async fn signal(&self, path: &str) -> Result<()> {
        let url = format!("{}{}", self.endpoint, path);
        let resp = self
            .http
            .get(&url)
            .timeout(self.control_timeout)
            .send()
            .await
            .map_err(|e| GenError::Network {
                context: format!("Failed to send {}", path),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(GenError::Http {
                status: resp.status().as_u16(),
                body: format!("{} was rejected", path),
            });
        }
        Ok(())
    }
}
