//! Remote predictions.

use std::sync::Arc;

use futures::future::try_join_all;
use fxn_values::{Prediction, RoutingPolicy, Tag, ValueMap, WireValue};

use crate::api::{PredictionApi, PredictionResponse, RemoteAcceleration, RemotePredictionRequest};
use crate::error::{RemoteError, RemoteResult};
use crate::marshal::RemoteMarshaller;

/// Runs predictions on Function's servers.
pub struct RemotePredictionService {
    api: Arc<dyn PredictionApi>,
    marshaller: RemoteMarshaller,
    routing: RoutingPolicy,
    client_id: String,
}

impl RemotePredictionService {
    pub fn new(
        api: Arc<dyn PredictionApi>,
        marshaller: RemoteMarshaller,
        routing: RoutingPolicy,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            marshaller,
            routing,
            client_id: client_id.into(),
        }
    }

    pub fn marshaller(&self) -> &RemoteMarshaller {
        &self.marshaller
    }

    /// Create a remote prediction.
    ///
    /// Inputs are marshalled concurrently; the request keeps their order.
    pub async fn create(
        &self,
        tag: &str,
        inputs: &ValueMap,
        acceleration: RemoteAcceleration,
    ) -> RemoteResult<Prediction> {
        let tag = Tag::parse(tag)?;
        let threshold = self.routing.inline_threshold;

        let wire_inputs = try_join_all(inputs.iter().map(|(name, value)| async move {
            let wire = self
                .marshaller
                .to_wire_value(value, name, threshold)
                .await
                .map_err(|e| RemoteError::for_key(name, e))?;
            Ok::<_, RemoteError>((name.clone(), wire))
        }))
        .await?;

        let request = RemotePredictionRequest {
            tag: tag.to_string(),
            inputs: wire_inputs.into_iter().collect(),
            acceleration,
            client_id: self.client_id.clone(),
        };
        log::info!("Creating remote prediction for {} on {:?}", tag, acceleration);
        let response = self.api.create_remote_prediction(&request).await?;
        self.to_prediction(response).await
    }

    async fn to_prediction(&self, response: PredictionResponse) -> RemoteResult<Prediction> {
        let mut prediction = Prediction::new(response.id, response.tag);
        if let Some(created) = response.created {
            prediction.created = created;
        }
        prediction.latency = response.latency;
        prediction.logs = response.logs;

        if let Some(error) = response.error {
            return Ok(prediction.with_error(error));
        }

        let Some(results) = response.results else {
            return Ok(prediction);
        };
        let values = try_join_all(results.into_iter().enumerate().map(|(index, json)| async move {
            let key = format!("results[{}]", index);
            let wire = WireValue::from_json(json).map_err(|e| RemoteError::for_key(&key, e.into()))?;
            self.marshaller
                .from_wire_value(&wire)
                .await
                .map_err(|e| RemoteError::for_key(&key, e))
        }))
        .await?;
        Ok(prediction.with_results(values))
    }
}
