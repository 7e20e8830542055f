//! Local prediction service: predictor cache, prediction and streaming.
//!
//! Predictors are loaded once per tag and kept until [`LocalPredictionService::delete`].
//! Loading is async (manifest fetch and resource downloads) but every native
//! call runs synchronously, so no engine handle is ever held across an await.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::try_join_all;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use fxn_resource_cache::ResourceCache;
use fxn_values::{Acceleration, Prediction, PredictionResource, Tag, ValueMap};

use crate::error::{BoxError, EngineError, Result};
use crate::handle::{ConfigurationHandle, PredictionHandle, PredictionStreamHandle, PredictorHandle};
use crate::library::Engine;
use crate::marshal::{from_engine_map, to_engine_map};

/// What the API returns when asked to run a predictor locally.
#[derive(Debug, Clone, Default)]
pub struct PredictorManifest {
    /// Opaque configuration token handed to the engine.
    pub configuration: Option<String>,
    pub resources: Vec<PredictionResource>,
}

/// Supplies predictor manifests. The HTTP API in production.
#[async_trait]
pub trait PredictionSource: Send + Sync {
    async fn fetch_manifest(
        &self,
        tag: &Tag,
        client_id: &str,
        configuration_id: &str,
    ) -> std::result::Result<PredictorManifest, BoxError>;
}

/// A native predictor ready to serve predictions.
pub struct LoadedPredictor {
    tag: Tag,
    // The engine does not promise re-entrant predictors.
    handle: Mutex<PredictorHandle>,
}

impl LoadedPredictor {
    pub fn tag(&self) -> &Tag {
        &self.tag
    }
}

type PredictorSlot = Arc<OnceCell<Arc<LoadedPredictor>>>;

/// Runs predictions on the local engine.
pub struct LocalPredictionService {
    engine: Arc<Engine>,
    source: Arc<dyn PredictionSource>,
    resources: Arc<ResourceCache>,
    acceleration: Acceleration,
    predictors: DashMap<Tag, PredictorSlot>,
}

impl LocalPredictionService {
    pub fn new(
        engine: Arc<Engine>,
        source: Arc<dyn PredictionSource>,
        resources: Arc<ResourceCache>,
    ) -> Self {
        Self {
            engine,
            source,
            resources,
            acceleration: Acceleration::Auto,
            predictors: DashMap::new(),
        }
    }

    /// Acceleration requested for predictors loaded from now on.
    pub fn with_acceleration(mut self, acceleration: Acceleration) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Run a prediction, loading the predictor first if it is not cached.
    pub async fn create(&self, tag: &str, inputs: &ValueMap) -> Result<Prediction> {
        let tag = Tag::parse(tag)?;
        let predictor = self.load(&tag).await?;

        let inputs = to_engine_map(&self.engine, inputs)?;
        let prediction = predictor.handle.lock().create_prediction(&inputs)?;
        read_prediction(&tag, &prediction)
    }

    /// Start a streaming prediction.
    ///
    /// The returned iterator owns the native stream; dropping it early
    /// releases the stream without draining it.
    pub async fn stream(&self, tag: &str, inputs: &ValueMap) -> Result<PredictionStream> {
        let tag = Tag::parse(tag)?;
        let predictor = self.load(&tag).await?;

        let inputs = to_engine_map(&self.engine, inputs)?;
        let stream = predictor.handle.lock().stream_prediction(&inputs)?;
        Ok(PredictionStream {
            stream,
            tag,
            _predictor: predictor,
            done: false,
        })
    }

    /// Unload a cached predictor. Returns `false` if none was loaded.
    ///
    /// A load still in progress is left alone and its predictor is cached
    /// when it completes. In-flight streams keep the native predictor alive
    /// until they finish.
    pub fn delete(&self, tag: &str) -> bool {
        let Ok(tag) = Tag::parse(tag) else {
            return false;
        };
        let removed = self.predictors.remove_if(&tag, |_, slot| slot.initialized()).is_some();
        if removed {
            log::info!("Unloaded predictor {}", tag);
        }
        removed
    }

    /// Whether a predictor for `tag` is loaded.
    pub fn is_loaded(&self, tag: &str) -> bool {
        Tag::parse(tag)
            .ok()
            .and_then(|tag| self.predictors.get(&tag).map(|slot| slot.initialized()))
            .unwrap_or(false)
    }

    /// Tags of every loaded predictor.
    pub fn loaded(&self) -> Vec<Tag> {
        self.predictors
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Tags whose predictor is still loading.
    pub fn loading(&self) -> Vec<Tag> {
        self.predictors
            .iter()
            .filter(|entry| !entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect()
    }

    async fn load(&self, tag: &Tag) -> Result<Arc<LoadedPredictor>> {
        // Concurrent first calls for one tag share a single load.
        let slot = self
            .predictors
            .entry(tag.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        match slot.get_or_try_init(|| self.build_predictor(tag)).await {
            Ok(predictor) => Ok(Arc::clone(predictor)),
            Err(e) => {
                // Drop the empty slot unless another caller is waiting to retry it.
                self.predictors.remove_if(tag, |_, current| {
                    Arc::ptr_eq(current, &slot) && !current.initialized() && Arc::strong_count(current) == 2
                });
                Err(e)
            }
        }
    }

    async fn build_predictor(&self, tag: &Tag) -> Result<Arc<LoadedPredictor>> {
        log::info!("Loading predictor {}", tag);

        let client_id = self.engine.client_id()?;
        let configuration_id = self.engine.configuration_id()?;
        let manifest = self
            .source
            .fetch_manifest(tag, &client_id, &configuration_id)
            .await
            .map_err(|source| EngineError::Manifest { tag: tag.to_string(), source })?;

        let resources = try_join_all(
            manifest
                .resources
                .iter()
                .filter(|resource| resource.resource_type != PredictionResource::ENGINE_LIBRARY)
                .map(|resource| async move {
                    let path = self.resources.retrieve(resource).await.map_err(|source| {
                        EngineError::ResourceProvisioning {
                            name: resource.name.clone().unwrap_or_else(|| resource.url.clone()),
                            source,
                        }
                    })?;
                    Ok::<_, EngineError>((resource.resource_type.clone(), path))
                }),
        )
        .await?;

        let mut configuration = ConfigurationHandle::new(&self.engine)?;
        configuration.set_tag(&tag.to_string())?;
        if let Some(token) = &manifest.configuration {
            configuration.set_token(token)?;
        }
        configuration.set_acceleration(self.acceleration)?;
        for (resource_type, path) in &resources {
            configuration.add_resource(resource_type, path)?;
        }
        let handle = PredictorHandle::new(&self.engine, &configuration)?;
        drop(configuration);

        log::info!("Loaded predictor {} with {} resources", tag, resources.len());

        Ok(Arc::new(LoadedPredictor {
            tag: tag.clone(),
            handle: Mutex::new(handle),
        }))
    }
}

/// Copy a native prediction into an application prediction.
fn read_prediction(tag: &Tag, handle: &PredictionHandle) -> Result<Prediction> {
    let mut prediction = Prediction::new(handle.id()?, tag.to_string());
    prediction.latency = Some(handle.latency()?);
    prediction.logs = handle.logs()?;

    if let Some(error) = handle.error()? {
        return Ok(prediction.with_error(error));
    }
    let results = match handle.results()? {
        Some(map) => from_engine_map(map)?.into_values().collect(),
        None => Vec::new(),
    };
    Ok(prediction.with_results(results))
}

/// Blocking iterator over a streaming prediction.
pub struct PredictionStream {
    stream: PredictionStreamHandle,
    tag: Tag,
    _predictor: Arc<LoadedPredictor>, // The native stream borrows the predictor
    done: bool,
}

impl Iterator for PredictionStream {
    type Item = Result<Prediction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.stream.read_next() {
            Ok(Some(handle)) => Some(read_prediction(&self.tag, &handle)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
