//! The Function client.

use std::sync::Arc;
use std::time::Duration;

use fxn_engine::{Engine, LocalPredictionService, PredictionStream};
use fxn_remote::{
    ApiClient, PredictionApi, RemoteAcceleration, RemoteMarshaller, RemotePredictionService,
    StorageService, Transport,
};
use fxn_resource_cache::ResourceCache;
use fxn_values::{Prediction, RoutingPolicy, ValueMap};

use crate::config::FunctionConfig;
use crate::error::{FunctionError, FunctionResult};
use crate::source::ApiPredictionSource;

/// Entry point for running predictors.
///
/// Remote predictions are always available. Local predictions need
/// [`FunctionConfig::library_path`] to point at the native engine.
pub struct Function {
    config: FunctionConfig,
    client_id: String,
    remote: RemotePredictionService,
    local: Option<LocalPredictionService>,
}

impl Function {
    /// Create a client talking to the configured API.
    pub fn new(config: FunctionConfig) -> FunctionResult<Self> {
        let engine = config.library_path.as_ref().map(Engine::load).transpose()?;
        let client_id = resolve_client_id(&config, engine.as_deref());
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        let api = Arc::new(ApiClient::new(
            config.api_url.clone(),
            config.access_key.clone(),
            client_id,
            timeout,
        )?);
        Ok(Self::from_parts(config, api.clone(), api, engine))
    }

    /// Assemble a client from explicit collaborators.
    pub fn from_parts(
        config: FunctionConfig,
        api: Arc<dyn PredictionApi>,
        transport: Arc<dyn Transport>,
        engine: Option<Arc<Engine>>,
    ) -> Self {
        let client_id = resolve_client_id(&config, engine.as_deref());
        let storage = Arc::new(StorageService::new(transport));
        let remote = RemotePredictionService::new(
            api.clone(),
            RemoteMarshaller::new(storage),
            RoutingPolicy::new(config.max_inline_size),
            client_id.clone(),
        );

        let local = engine.map(|engine| {
            let source = Arc::new(ApiPredictionSource::new(api));
            let resources = Arc::new(ResourceCache::new(&config.cache_dir));
            LocalPredictionService::new(engine, source, resources).with_acceleration(config.acceleration)
        });

        Self {
            config,
            client_id,
            remote,
            local,
        }
    }

    pub fn config(&self) -> &FunctionConfig {
        &self.config
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn remote(&self) -> &RemotePredictionService {
        &self.remote
    }

    /// The local service, if an engine is loaded.
    pub fn local(&self) -> Option<&LocalPredictionService> {
        self.local.as_ref()
    }

    /// Run a predictor on the local engine.
    pub async fn create_prediction(&self, tag: &str, inputs: &ValueMap) -> FunctionResult<Prediction> {
        Ok(self.require_local()?.create(tag, inputs).await?)
    }

    /// Stream predictions from the local engine.
    pub async fn stream_prediction(&self, tag: &str, inputs: &ValueMap) -> FunctionResult<PredictionStream> {
        Ok(self.require_local()?.stream(tag, inputs).await?)
    }

    /// Unload a local predictor. Returns `false` if it was not loaded.
    pub fn delete_predictor(&self, tag: &str) -> FunctionResult<bool> {
        Ok(self.require_local()?.delete(tag))
    }

    /// Run a predictor on Function's servers.
    ///
    /// Falls back to the configured remote acceleration when none is given.
    pub async fn create_remote_prediction(
        &self,
        tag: &str,
        inputs: &ValueMap,
        acceleration: Option<RemoteAcceleration>,
    ) -> FunctionResult<Prediction> {
        let acceleration = acceleration.unwrap_or(self.config.remote_acceleration);
        Ok(self.remote.create(tag, inputs, acceleration).await?)
    }

    fn require_local(&self) -> FunctionResult<&LocalPredictionService> {
        self.local.as_ref().ok_or(FunctionError::LocalUnavailable)
    }
}

fn resolve_client_id(config: &FunctionConfig, engine: Option<&Engine>) -> String {
    if let Some(client_id) = &config.client_id {
        return client_id.clone();
    }
    match engine.map(Engine::client_id) {
        Some(Ok(client_id)) => client_id,
        Some(Err(e)) => {
            log::warn!("Engine did not report a client id: {}", e);
            platform_client_id()
        }
        None => platform_client_id(),
    }
}

fn platform_client_id() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}
