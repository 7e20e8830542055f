//! Request and response types for the Function prediction API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fxn_values::serde_json::Value as JsonValue;
use fxn_values::{PredictionResource, WireValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::RemoteResult;

/// Hardware for remote predictions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteAcceleration {
    #[default]
    Auto,
    Cpu,
    A40,
    A100,
}

impl std::str::FromStr for RemoteAcceleration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(RemoteAcceleration::Auto),
            "cpu" => Ok(RemoteAcceleration::Cpu),
            "a40" => Ok(RemoteAcceleration::A40),
            "a100" => Ok(RemoteAcceleration::A100),
            other => Err(format!("unknown remote acceleration '{}'", other)),
        }
    }
}

/// Body of `POST /predictions/remote`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePredictionRequest {
    pub tag: String,
    pub inputs: IndexMap<String, WireValue>,
    pub acceleration: RemoteAcceleration,
    pub client_id: String,
}

/// Body of `POST /predictions`, which returns a predictor manifest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePredictionRequest {
    pub tag: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_id: Option<String>,
}

/// Prediction as returned by the API.
///
/// `results` stay raw JSON so that an unknown type tag is reported as such
/// when each result is parsed, rather than failing the whole response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub id: String,
    pub tag: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Option<Vec<JsonValue>>,
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub logs: Option<String>,
    #[serde(default)]
    pub resources: Vec<PredictionResource>,
    #[serde(default)]
    pub configuration: Option<String>,
}

/// Prediction endpoints of the Function API.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn create_prediction(&self, request: &CreatePredictionRequest) -> RemoteResult<PredictionResponse>;

    async fn create_remote_prediction(
        &self,
        request: &RemotePredictionRequest,
    ) -> RemoteResult<PredictionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxn_values::serde_json::{self, json};
    use fxn_values::Dtype;

    #[test]
    fn test_remote_request_shape() {
        let mut inputs = IndexMap::new();
        inputs.insert("prompt".to_string(), WireValue {
            data: Some("data:text/plain;base64,aGk=".into()),
            dtype: Dtype::String,
            shape: None,
        });
        let request = RemotePredictionRequest {
            tag: "@fxn/greeting".into(),
            inputs,
            acceleration: RemoteAcceleration::A100,
            client_id: "linux-x86_64".into(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "tag": "@fxn/greeting",
                "inputs": {
                    "prompt": { "data": "data:text/plain;base64,aGk=", "type": "string", "shape": null }
                },
                "acceleration": "a100",
                "clientId": "linux-x86_64",
            })
        );
    }

    #[test]
    fn test_prediction_response_defaults() {
        let response: PredictionResponse = serde_json::from_value(json!({
            "id": "pred_123",
            "tag": "@fxn/greeting",
            "configuration": "token",
            "resources": [{ "type": "bin", "url": "https://cdn.fxn.ai/w.bin" }],
        }))
        .unwrap();
        assert!(response.results.is_none());
        assert_eq!(response.resources.len(), 1);
        assert_eq!(response.resources[0].resource_type, "bin");
        assert_eq!(response.configuration.as_deref(), Some("token"));
    }

    #[test]
    fn test_acceleration_parse() {
        assert_eq!("A40".parse::<RemoteAcceleration>().unwrap(), RemoteAcceleration::A40);
        assert!("tpu".parse::<RemoteAcceleration>().is_err());
    }
}
