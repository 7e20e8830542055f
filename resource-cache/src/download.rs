//! Fetching resources over HTTP with progress reporting.

use crate::error::{ResourceCacheError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::sync::Arc;

/// Progress callback for downloads: `(downloaded, total)` in bytes.
/// `total` is 0 when the server does not report a content length.
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Source of resource bytes.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str, progress: Option<ProgressCallback>) -> Result<Vec<u8>>;
}

/// Fetches resources over HTTP(S).
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("fxn-resource-cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Share an existing client (connection pool, proxy settings).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, progress: Option<ProgressCallback>) -> Result<Vec<u8>> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ResourceCacheError::Download(format!(
                "Unsupported resource URL: '{}'",
                url
            )));
        }

        log::debug!("Downloading resource from {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ResourceCacheError::Download(format!(
                "HTTP {} while downloading {}",
                response.status(),
                url
            )));
        }

        let total_size = response.content_length().unwrap_or(0);

        let mut downloaded = 0u64;
        let mut buffer = Vec::with_capacity(total_size as usize);

        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.extend_from_slice(&chunk);
            downloaded += chunk.len() as u64;

            if let Some(ref callback) = progress {
                callback(downloaded, total_size);
            }
        }

        log::info!("Downloaded {} ({} bytes)", url, downloaded);

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch("file:///etc/passwd", None).await.unwrap_err();
        assert!(matches!(err, ResourceCacheError::Download(_)));
    }
}
