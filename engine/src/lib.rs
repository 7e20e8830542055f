//! Native engine bindings for Function predictors
//!
//! This crate loads the Function engine shared library, wraps its C API in
//! owning handles, and marshals [`fxn_values::Value`]s across the boundary.
//!
//! # Layers
//!
//! ```text
//! service   LocalPredictionService: predictor cache, create / stream / delete
//! marshal   Value <-> native value, ValueMap <-> native value map
//! handle    RAII handles (values, maps, configurations, predictors, predictions)
//! library   Engine: dynamically loaded function table
//! ffi       raw C signatures and constants
//! ```
//!
//! Every native object is released exactly once by its handle's `Drop`.
//! Values inserted into a map are owned by the map; result maps are owned by
//! their prediction. Application values returned from this crate never borrow
//! native memory.

pub mod error;
pub mod ffi;
pub mod handle;
pub mod library;
pub mod marshal;
pub mod service;

pub use error::{BoxError, EngineError, Result, Status};
pub use handle::{
    ConfigurationHandle, PredictionHandle, PredictionStreamHandle, PredictorHandle, ValueHandle,
    ValueMapHandle, ValueMapRef, ValueRef,
};
pub use library::Engine;
pub use marshal::{from_engine_map, from_engine_value, to_engine_map, to_engine_value};
pub use service::{
    LoadedPredictor, LocalPredictionService, PredictionSource, PredictionStream, PredictorManifest,
};
