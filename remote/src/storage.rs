//! Size-routed uploads and `data:`-aware downloads.

use std::sync::Arc;

use bytes::Bytes;
use fxn_values::routing::{route, Route};
use fxn_values::wire::{decode_data_url, encode_data_url, is_data_url};

use crate::error::RemoteResult;
use crate::transport::Transport;

pub struct StorageService {
    transport: Arc<dyn Transport>,
}

impl StorageService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Store `data` and return a URL it can be read from.
    ///
    /// Payloads strictly smaller than `inline_threshold` become a `data:` URL
    /// with no network traffic. Everything else is uploaded.
    pub async fn upload(
        &self,
        name: &str,
        data: Bytes,
        mime: &str,
        inline_threshold: usize,
    ) -> RemoteResult<String> {
        match route(data.len(), inline_threshold) {
            Route::Inline => Ok(encode_data_url(&data, Some(mime))),
            Route::Upload => {
                log::debug!("Uploading '{}' ({} bytes, {})", name, data.len(), mime);
                let location = self.transport.request_upload_location(name).await?;
                self.transport.upload(&location.upload_url, data, mime).await?;
                Ok(location.download_url)
            }
        }
    }

    /// Read back a value URL. `data:` URLs are decoded in place.
    pub async fn download(&self, url: &str) -> RemoteResult<Bytes> {
        if is_data_url(url) {
            return Ok(decode_data_url(url)?.into());
        }
        self.transport.download(url).await
    }
}
