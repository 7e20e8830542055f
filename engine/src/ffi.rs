//! Low-level FFI bindings to the Function engine C API
//!
//! This module provides unsafe bindings to the native engine library.
//! All function signatures match the C API exactly. Every function except
//! `FXNGetVersion` returns an [`FXNStatus`]; results come back through
//! out-pointers.

use std::os::raw::{c_char, c_double, c_int, c_void};

/// Opaque pointer to FXNValue
#[repr(C)]
pub struct FXNValue {
    _private: [u8; 0],
}

/// Opaque pointer to FXNValueMap
#[repr(C)]
pub struct FXNValueMap {
    _private: [u8; 0],
}

/// Opaque pointer to FXNConfiguration
#[repr(C)]
pub struct FXNConfiguration {
    _private: [u8; 0],
}

/// Opaque pointer to FXNPredictor
#[repr(C)]
pub struct FXNPredictor {
    _private: [u8; 0],
}

/// Opaque pointer to FXNPrediction
#[repr(C)]
pub struct FXNPrediction {
    _private: [u8; 0],
}

/// Opaque pointer to FXNPredictionStream
#[repr(C)]
pub struct FXNPredictionStream {
    _private: [u8; 0],
}

/// Status code returned by every engine function.
pub type FXNStatus = c_int;

pub const FXN_OK: FXNStatus = 0;
pub const FXN_ERROR_INVALID_ARGUMENT: FXNStatus = 1;
pub const FXN_ERROR_INVALID_OPERATION: FXNStatus = 2;
pub const FXN_ERROR_NOT_IMPLEMENTED: FXNStatus = 3;

/// Value dtype discriminant (see `fxn_values::Dtype`).
pub type FXNDtype = c_int;

/// Value creation flags.
pub type FXNValueFlags = c_int;

pub const FXN_VALUE_FLAG_NONE: FXNValueFlags = 0;
/// Engine copies the input buffer instead of referencing it.
pub const FXN_VALUE_FLAG_COPY_DATA: FXNValueFlags = 1;

/// Acceleration bit flags.
pub type FXNAcceleration = c_int;

/// FFI function signatures for the Function engine
/// These are loaded dynamically from the engine shared library
#[derive(Clone, Copy)]
pub struct FunctionTable {
    // Values
    pub value_release: unsafe extern "C" fn(value: *mut FXNValue) -> FXNStatus,
    pub value_get_data: unsafe extern "C" fn(
        value: *mut FXNValue,
        data: *mut *mut c_void,
    ) -> FXNStatus,
    pub value_get_type: unsafe extern "C" fn(
        value: *mut FXNValue,
        dtype: *mut FXNDtype,
    ) -> FXNStatus,
    pub value_get_dimensions: unsafe extern "C" fn(
        value: *mut FXNValue,
        dimensions: *mut i32,
    ) -> FXNStatus,
    pub value_get_shape: unsafe extern "C" fn(
        value: *mut FXNValue,
        shape: *mut i32,
        dimensions: i32,
    ) -> FXNStatus,
    pub value_create_array: unsafe extern "C" fn(
        data: *mut c_void,
        shape: *const i32,
        dimensions: i32,
        dtype: FXNDtype,
        flags: FXNValueFlags,
        value: *mut *mut FXNValue,
    ) -> FXNStatus,
    pub value_create_string: unsafe extern "C" fn(
        data: *const c_char,
        value: *mut *mut FXNValue,
    ) -> FXNStatus,
    pub value_create_list: unsafe extern "C" fn(
        data: *const c_char,
        value: *mut *mut FXNValue,
    ) -> FXNStatus,
    pub value_create_dict: unsafe extern "C" fn(
        data: *const c_char,
        value: *mut *mut FXNValue,
    ) -> FXNStatus,
    pub value_create_image: unsafe extern "C" fn(
        pixels: *const u8,
        width: i32,
        height: i32,
        channels: i32,
        flags: FXNValueFlags,
        value: *mut *mut FXNValue,
    ) -> FXNStatus,
    pub value_create_binary: unsafe extern "C" fn(
        buffer: *mut c_void,
        buffer_len: i32,
        flags: FXNValueFlags,
        value: *mut *mut FXNValue,
    ) -> FXNStatus,
    pub value_create_null: unsafe extern "C" fn(value: *mut *mut FXNValue) -> FXNStatus,

    // Value maps
    pub value_map_create: unsafe extern "C" fn(map: *mut *mut FXNValueMap) -> FXNStatus,
    pub value_map_release: unsafe extern "C" fn(map: *mut FXNValueMap) -> FXNStatus,
    pub value_map_get_size: unsafe extern "C" fn(
        map: *mut FXNValueMap,
        size: *mut i32,
    ) -> FXNStatus,
    pub value_map_get_key: unsafe extern "C" fn(
        map: *mut FXNValueMap,
        index: i32,
        key: *mut c_char,
        size: i32,
    ) -> FXNStatus,
    pub value_map_get_value: unsafe extern "C" fn(
        map: *mut FXNValueMap,
        key: *const c_char,
        value: *mut *mut FXNValue,
    ) -> FXNStatus,
    /// The map takes ownership of `value` on success.
    pub value_map_set_value: unsafe extern "C" fn(
        map: *mut FXNValueMap,
        key: *const c_char,
        value: *mut FXNValue,
    ) -> FXNStatus,

    // Configuration
    pub configuration_get_unique_id: unsafe extern "C" fn(
        id: *mut c_char,
        size: i32,
    ) -> FXNStatus,
    pub configuration_get_client_id: unsafe extern "C" fn(
        id: *mut c_char,
        size: i32,
    ) -> FXNStatus,
    pub configuration_create: unsafe extern "C" fn(
        configuration: *mut *mut FXNConfiguration,
    ) -> FXNStatus,
    pub configuration_release: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
    ) -> FXNStatus,
    pub configuration_get_tag: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
        tag: *mut c_char,
        size: i32,
    ) -> FXNStatus,
    pub configuration_set_tag: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
        tag: *const c_char,
    ) -> FXNStatus,
    pub configuration_get_token: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
        token: *mut c_char,
        size: i32,
    ) -> FXNStatus,
    pub configuration_set_token: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
        token: *const c_char,
    ) -> FXNStatus,
    pub configuration_get_acceleration: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
        acceleration: *mut FXNAcceleration,
    ) -> FXNStatus,
    pub configuration_set_acceleration: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
        acceleration: FXNAcceleration,
    ) -> FXNStatus,
    pub configuration_get_device: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
        device: *mut *mut c_void,
    ) -> FXNStatus,
    pub configuration_set_device: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
        device: *mut c_void,
    ) -> FXNStatus,
    pub configuration_add_resource: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
        resource_type: *const c_char,
        path: *const c_char,
    ) -> FXNStatus,

    // Predictions
    pub prediction_release: unsafe extern "C" fn(prediction: *mut FXNPrediction) -> FXNStatus,
    pub prediction_get_id: unsafe extern "C" fn(
        prediction: *mut FXNPrediction,
        id: *mut c_char,
        size: i32,
    ) -> FXNStatus,
    pub prediction_get_latency: unsafe extern "C" fn(
        prediction: *mut FXNPrediction,
        latency: *mut c_double,
    ) -> FXNStatus,
    /// The returned map is owned by the prediction.
    pub prediction_get_results: unsafe extern "C" fn(
        prediction: *mut FXNPrediction,
        results: *mut *mut FXNValueMap,
    ) -> FXNStatus,
    /// Returns `FXN_ERROR_INVALID_OPERATION` when the prediction has no error.
    pub prediction_get_error: unsafe extern "C" fn(
        prediction: *mut FXNPrediction,
        error: *mut c_char,
        size: i32,
    ) -> FXNStatus,
    pub prediction_get_logs: unsafe extern "C" fn(
        prediction: *mut FXNPrediction,
        logs: *mut c_char,
        size: i32,
    ) -> FXNStatus,
    pub prediction_get_log_length: unsafe extern "C" fn(
        prediction: *mut FXNPrediction,
        length: *mut i32,
    ) -> FXNStatus,

    // Prediction streams
    pub prediction_stream_release: unsafe extern "C" fn(
        stream: *mut FXNPredictionStream,
    ) -> FXNStatus,
    /// Returns `FXN_ERROR_INVALID_OPERATION` once the stream is exhausted.
    pub prediction_stream_read_next: unsafe extern "C" fn(
        stream: *mut FXNPredictionStream,
        prediction: *mut *mut FXNPrediction,
    ) -> FXNStatus,

    // Predictors
    pub predictor_create: unsafe extern "C" fn(
        configuration: *mut FXNConfiguration,
        predictor: *mut *mut FXNPredictor,
    ) -> FXNStatus,
    pub predictor_release: unsafe extern "C" fn(predictor: *mut FXNPredictor) -> FXNStatus,
    pub predictor_create_prediction: unsafe extern "C" fn(
        predictor: *mut FXNPredictor,
        inputs: *mut FXNValueMap,
        prediction: *mut *mut FXNPrediction,
    ) -> FXNStatus,
    pub predictor_stream_prediction: unsafe extern "C" fn(
        predictor: *mut FXNPredictor,
        inputs: *mut FXNValueMap,
        stream: *mut *mut FXNPredictionStream,
    ) -> FXNStatus,

    // Version
    pub get_version: unsafe extern "C" fn() -> *const c_char,
}
