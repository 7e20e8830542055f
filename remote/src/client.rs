//! HTTP client for the Function API.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::{CreatePredictionRequest, PredictionApi, PredictionResponse, RemotePredictionRequest};
use crate::error::{RemoteError, RemoteResult};
use crate::transport::{Transport, UploadLocation};

/// Default Function API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.fxn.ai/v1";

/// Client for the Function REST API.
///
/// Authenticated requests carry the access key as a bearer token and the
/// client identifier in the `fxn-client` header. Uploads and downloads go
/// to pre-signed URLs and carry neither.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    url: String,
    access_key: Option<String>,
    client_id: String,
}

impl ApiClient {
    pub fn new(
        url: impl Into<String>,
        access_key: Option<String>,
        client_id: impl Into<String>,
        timeout: Option<Duration>,
    ) -> RemoteResult<Self> {
        let url = url.into().trim_end_matches('/').to_string();
        let mut builder = Client::builder().user_agent(concat!("fxn-rs/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| RemoteError::transport(&url, e))?;

        Ok(Self {
            http,
            url,
            access_key: access_key.filter(|key| !key.is_empty()),
            client_id: client_id.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn request(&self, method: Method, path: &str) -> (String, RequestBuilder) {
        let url = format!("{}{}", self.url, path);
        let mut request = self.http.request(method, &url).header("fxn-client", &self.client_id);
        if let Some(key) = &self.access_key {
            request = request.bearer_auth(key);
        }
        (url, request)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> RemoteResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (url, request) = self.request(Method::POST, path);
        log::debug!("POST {}", url);
        let response = request.json(body).send().await.map_err(|e| RemoteError::transport(&url, e))?;
        let response = check_api_response(response).await?;
        response.json::<T>().await.map_err(|e| RemoteError::transport(&url, e))
    }
}

/// Turn a non-2xx API response into [`RemoteError::Api`].
async fn check_api_response(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    #[derive(Deserialize)]
    struct ErrorMessage {
        message: String,
    }

    #[derive(Deserialize)]
    struct ErrorPayload {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        errors: Option<Vec<ErrorMessage>>,
    }

    let body = response.text().await.unwrap_or_default();
    let message = fxn_values::serde_json::from_str::<ErrorPayload>(&body)
        .ok()
        .and_then(|payload| {
            payload
                .error
                .or_else(|| payload.errors.and_then(|errors| errors.into_iter().next().map(|e| e.message)))
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                "An unknown error occurred".to_string()
            } else {
                body
            }
        });

    Err(RemoteError::Api { status: status.as_u16(), message })
}

#[async_trait]
impl PredictionApi for ApiClient {
    async fn create_prediction(&self, request: &CreatePredictionRequest) -> RemoteResult<PredictionResponse> {
        self.post_json("/predictions", request).await
    }

    async fn create_remote_prediction(
        &self,
        request: &RemotePredictionRequest,
    ) -> RemoteResult<PredictionResponse> {
        self.post_json("/predictions/remote", request).await
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn request_upload_location(&self, name: &str) -> RemoteResult<UploadLocation> {
        #[derive(serde::Serialize)]
        struct CreateValue<'a> {
            name: &'a str,
        }
        self.post_json("/values", &CreateValue { name }).await
    }

    async fn upload(&self, url: &str, data: Bytes, mime: &str) -> RemoteResult<()> {
        let response = self
            .http
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(data)
            .send()
            .await
            .map_err(|e| RemoteError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Transport {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {} while uploading: {}", status, message),
            });
        }
        Ok(())
    }

    async fn download(&self, url: &str) -> RemoteResult<Bytes> {
        let response = self.http.get(url).send().await.map_err(|e| RemoteError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Transport {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {} while downloading", status),
            });
        }

        let data = response.bytes().await.map_err(|e| RemoteError::transport(url, e))?;
        log::debug!("Downloaded {} ({} bytes)", url, data.len());
        Ok(data)
    }
}
