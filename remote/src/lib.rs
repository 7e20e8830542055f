//! Remote side of the Function SDK
//!
//! Converts [`fxn_values::Value`]s to and from the JSON wire records the
//! Function API exchanges, moving payloads either inline as `data:` URLs or
//! through upload URLs depending on their size.
//!
//! - [`RemoteMarshaller`]: `Value` <-> [`fxn_values::WireValue`]
//! - [`StorageService`]: size routing, uploads and downloads
//! - [`ApiClient`]: `reqwest` client for the REST API
//! - [`RemotePredictionService`]: `POST /predictions/remote`

pub mod api;
pub mod client;
pub mod error;
pub mod marshal;
pub mod service;
pub mod storage;
pub mod transport;

pub use api::{
    CreatePredictionRequest, PredictionApi, PredictionResponse, RemoteAcceleration,
    RemotePredictionRequest,
};
pub use client::{ApiClient, DEFAULT_API_URL};
pub use error::{RemoteError, RemoteResult};
pub use marshal::RemoteMarshaller;
pub use service::RemotePredictionService;
pub use storage::StorageService;
pub use transport::{Transport, UploadLocation};
