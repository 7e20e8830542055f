//! Prediction results and the resources a predictor depends on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A native artifact that must exist locally before a predictor can load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PredictionResource {
    /// Resource type for the engine library itself, which is never
    /// provisioned through the cache.
    pub const ENGINE_LIBRARY: &'static str = "fxn";

    pub fn new(resource_type: impl Into<String>, url: impl Into<String>) -> Self {
        PredictionResource {
            resource_type: resource_type.into(),
            url: url.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Hardware hint for local predictors. Values match the engine bit flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum Acceleration {
    #[default]
    Auto = 0,
    Cpu = 1,
    Gpu = 2,
    Npu = 4,
}

/// Outcome of one predictor invocation.
///
/// Invariant: when `error` is set, `results` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub id: String,
    pub tag: String,
    pub created: DateTime<Utc>,
    results: Option<Vec<Value>>,
    /// Latency in milliseconds.
    pub latency: Option<f64>,
    error: Option<String>,
    pub logs: Option<String>,
    pub resources: Vec<PredictionResource>,
    /// Deferred configuration token handed to the engine on first load.
    pub configuration: Option<String>,
}

impl Prediction {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Prediction {
            id: id.into(),
            tag: tag.into(),
            created: Utc::now(),
            results: None,
            latency: None,
            error: None,
            logs: None,
            resources: Vec::new(),
            configuration: None,
        }
    }

    /// Attach results. Ignored when the prediction already carries an error.
    pub fn with_results(mut self, results: Vec<Value>) -> Self {
        if self.error.is_none() {
            self.results = Some(results);
        }
        self
    }

    /// Attach an error, discarding any results.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.results = None;
        self
    }

    pub fn results(&self) -> Option<&[Value]> {
        self.results.as_deref()
    }

    pub fn into_results(self) -> Option<Vec<Value>> {
        self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_clears_results() {
        let prediction = Prediction::new("pred_1", "@fxn/greeting")
            .with_results(vec![Value::from("hi")])
            .with_error("boom");
        assert_eq!(prediction.error(), Some("boom"));
        assert!(prediction.results().is_none());

        let prediction = prediction.with_results(vec![Value::Null]);
        assert!(prediction.results().is_none());
    }

    #[test]
    fn test_resource_wire_form() {
        let json = serde_json::json!({ "type": "dso", "url": "https://cdn.fxn.ai/lib.so", "name": "lib.so" });
        let resource: PredictionResource = serde_json::from_value(json).unwrap();
        assert_eq!(resource, PredictionResource::new("dso", "https://cdn.fxn.ai/lib.so").with_name("lib.so"));
    }

    #[test]
    fn test_acceleration_flags() {
        assert_eq!(Acceleration::Gpu as i32, 2);
        assert_eq!(Acceleration::Npu as i32, 4);
        assert_eq!(serde_json::to_string(&Acceleration::Cpu).unwrap(), "\"cpu\"");
    }
}
