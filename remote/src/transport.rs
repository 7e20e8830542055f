//! Upload and download collaborator used by the remote marshaller.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use crate::error::RemoteResult;

/// Where to upload a value and where it can be read back from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLocation {
    pub upload_url: String,
    pub download_url: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn request_upload_location(&self, name: &str) -> RemoteResult<UploadLocation>;

    async fn upload(&self, url: &str, data: Bytes, mime: &str) -> RemoteResult<()>;

    async fn download(&self, url: &str) -> RemoteResult<Bytes>;
}
