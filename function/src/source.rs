//! Predictor manifests from the Function API.

use std::sync::Arc;

use async_trait::async_trait;
use fxn_engine::{BoxError, PredictionSource, PredictorManifest};
use fxn_remote::{CreatePredictionRequest, PredictionApi};
use fxn_values::Tag;

/// [`PredictionSource`] backed by `POST /predictions`.
pub struct ApiPredictionSource {
    api: Arc<dyn PredictionApi>,
}

impl ApiPredictionSource {
    pub fn new(api: Arc<dyn PredictionApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PredictionSource for ApiPredictionSource {
    async fn fetch_manifest(
        &self,
        tag: &Tag,
        client_id: &str,
        configuration_id: &str,
    ) -> Result<PredictorManifest, BoxError> {
        let request = CreatePredictionRequest {
            tag: tag.to_string(),
            client_id: client_id.to_string(),
            configuration_id: Some(configuration_id.to_string()),
        };
        let response = self.api.create_prediction(&request).await?;
        if let Some(error) = response.error {
            return Err(format!("Failed to create prediction for {}: {}", tag, error).into());
        }
        log::debug!("Manifest for {} lists {} resources", tag, response.resources.len());
        Ok(PredictorManifest {
            configuration: response.configuration,
            resources: response.resources,
        })
    }
}
