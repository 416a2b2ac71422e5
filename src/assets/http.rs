//! HTTP image source, with opt-in `file://` reads for local tools.

use async_trait::async_trait;
use image::DynamicImage;
use std::time::Duration;

use super::{AssetError, ImageSource, decode_image};

/// Default user agent for outgoing image requests.
pub const DEFAULT_USER_AGENT: &str = "labelpress/0.1";

/// Fetches `http(s)://` URLs with reqwest.
///
/// `file://` URLs are rejected as unsupported unless the source was built
/// with [`HttpImageSource::with_local_files`]; the server never enables it.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
    local_files: bool,
}

impl HttpImageSource {
    /// Build a source with the given user agent and optional request timeout.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, AssetError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| AssetError::Fetch {
            url: String::new(),
            reason: format!("HTTP client error: {}", e),
        })?;
        Ok(Self::with_client(client))
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            local_files: false,
        }
    }

    /// Also read `file://` URLs from the local disk.
    pub fn with_local_files(mut self) -> Self {
        self.local_files = true;
        self
    }

    async fn fetch_http(&self, url: &str) -> Result<DynamicImage, AssetError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AssetError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(AssetError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(|e| AssetError::Fetch {
            url: url.to_string(),
            reason: format!("Failed to read image data: {}", e),
        })?;
        decode_image(url, &bytes)
    }

    async fn fetch_file(&self, url: &str, path: &str) -> Result<DynamicImage, AssetError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(url.to_string()),
            _ => AssetError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            },
        })?;
        decode_image(url, &bytes)
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, AssetError> {
        log::debug!("fetching image {}", url);
        if url.starts_with("http://") || url.starts_with("https://") {
            self.fetch_http(url).await
        } else if let Some(path) = url.strip_prefix("file://").filter(|_| self.local_files) {
            self.fetch_file(url, path).await
        } else {
            Err(AssetError::Unsupported(url.to_string()))
        }
    }
}
