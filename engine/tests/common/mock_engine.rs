//! In-process engine used by the integration tests.
//!
//! Implements the C API in Rust with the same ownership rules as the real
//! engine: maps own the values set into them, predictions own their result
//! maps, and every object must be released exactly once. Live objects are
//! counted per thread so each test can assert that nothing leaked.

#![allow(dead_code)]

use std::cell::Cell;
use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_void};
use std::ptr;
use std::sync::Arc;

use fxn_engine::ffi::*;
use fxn_engine::Engine;
use fxn_values::Dtype;

/// Number of predictions a mock stream yields.
pub const STREAM_LENGTH: usize = 3;

/// Client identifier reported by the mock engine.
pub const CLIENT_ID: &str = "mock-client";

/// Configuration identifier reported by the mock engine.
pub const CONFIGURATION_ID: &str = "mock-configuration";

thread_local! {
    static LIVE: Cell<i64> = const { Cell::new(0) };
    static PREDICTORS_CREATED: Cell<usize> = const { Cell::new(0) };
    static LAST_CONFIGURATION: std::cell::RefCell<Option<ConfigurationSnapshot>> =
        const { std::cell::RefCell::new(None) };
}

/// Native objects currently alive on this thread.
pub fn live_objects() -> i64 {
    LIVE.with(|live| live.get())
}

/// Predictors created on this thread.
pub fn predictors_created() -> usize {
    PREDICTORS_CREATED.with(|count| count.get())
}

/// Configuration seen by the most recent predictor creation.
pub fn last_configuration() -> Option<ConfigurationSnapshot> {
    LAST_CONFIGURATION.with(|last| last.borrow().clone())
}

pub fn engine() -> Arc<Engine> {
    Engine::from_table(table())
}

/// Keeps the live-object count in step with allocations.
struct Live;

impl Live {
    fn new() -> Self {
        LIVE.with(|live| live.set(live.get() + 1));
        Live
    }
}

impl Drop for Live {
    fn drop(&mut self) {
        LIVE.with(|live| live.set(live.get() - 1));
    }
}

struct MockValue {
    dtype: i32,
    data: Vec<u8>,
    shape: Vec<i32>,
    _live: Live,
}

impl MockValue {
    fn new(dtype: Dtype, data: Vec<u8>, shape: Vec<i32>) -> Box<Self> {
        Box::new(MockValue { dtype: dtype as i32, data, shape, _live: Live::new() })
    }

    fn text(dtype: Dtype, text: *const c_char) -> Box<Self> {
        // SAFETY: callers pass NUL-terminated strings.
        let mut data = unsafe { CStr::from_ptr(text) }.to_bytes().to_vec();
        data.push(0);
        Self::new(dtype, data, Vec::new())
    }

    fn duplicate(&self) -> Box<Self> {
        Box::new(MockValue {
            dtype: self.dtype,
            data: self.data.clone(),
            shape: self.shape.clone(),
            _live: Live::new(),
        })
    }
}

struct MockMap {
    entries: Vec<(String, Box<MockValue>)>,
    _live: Live,
}

impl MockMap {
    fn new() -> Box<Self> {
        Box::new(MockMap { entries: Vec::new(), _live: Live::new() })
    }

    fn duplicate(&self) -> Box<Self> {
        let mut map = Self::new();
        map.entries = self
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), value.duplicate()))
            .collect();
        map
    }
}

/// What a configuration held when a predictor was created from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationSnapshot {
    pub tag: String,
    pub token: String,
    pub acceleration: i32,
    pub resources: Vec<(String, String)>,
}

struct MockConfiguration {
    snapshot: ConfigurationSnapshot,
    device: *mut c_void,
    _live: Live,
}

struct MockPredictor {
    tag: String,
    _live: Live,
}

struct MockPrediction {
    id: String,
    latency: f64,
    results: Option<Box<MockMap>>,
    error: Option<String>,
    logs: Option<String>,
    _live: Live,
}

struct MockStream {
    tag: String,
    inputs: Box<MockMap>,
    produced: usize,
    _live: Live,
}

fn predict(tag: &str, inputs: &MockMap, index: usize) -> Box<MockPrediction> {
    let failed = tag.contains("error");
    Box::new(MockPrediction {
        id: format!("{}-{}", tag, index),
        latency: 1.5,
        results: (!failed).then(|| inputs.duplicate()),
        error: failed.then(|| "Predictor raised an exception".to_string()),
        logs: Some(format!("processed {} inputs", inputs.entries.len())),
        _live: Live::new(),
    })
}

unsafe fn write_string(text: &str, buffer: *mut c_char, size: i32) -> FXNStatus {
    if buffer.is_null() || size <= 0 {
        return FXN_ERROR_INVALID_ARGUMENT;
    }
    let bytes = text.as_bytes();
    let len = bytes.len().min(size as usize - 1);
    ptr::copy_nonoverlapping(bytes.as_ptr(), buffer as *mut u8, len);
    *buffer.add(len) = 0;
    FXN_OK
}

unsafe fn read_string(text: *const c_char) -> Option<String> {
    (!text.is_null()).then(|| CStr::from_ptr(text).to_string_lossy().into_owned())
}

unsafe fn emit<T, U>(object: Box<T>, out: *mut *mut U) -> FXNStatus {
    if out.is_null() {
        return FXN_ERROR_INVALID_ARGUMENT;
    }
    *out = Box::into_raw(object) as *mut U;
    FXN_OK
}

// ============================================================================
// Values
// ============================================================================

unsafe extern "C" fn value_release(value: *mut FXNValue) -> FXNStatus {
    if value.is_null() {
        return FXN_ERROR_INVALID_ARGUMENT;
    }
    drop(Box::from_raw(value as *mut MockValue));
    FXN_OK
}

unsafe extern "C" fn value_get_data(value: *mut FXNValue, data: *mut *mut c_void) -> FXNStatus {
    let value = &mut *(value as *mut MockValue);
    *data = if value.data.is_empty() { ptr::null_mut() } else { value.data.as_mut_ptr() as *mut c_void };
    FXN_OK
}

unsafe extern "C" fn value_get_type(value: *mut FXNValue, dtype: *mut FXNDtype) -> FXNStatus {
    *dtype = (*(value as *mut MockValue)).dtype;
    FXN_OK
}

unsafe extern "C" fn value_get_dimensions(value: *mut FXNValue, dimensions: *mut i32) -> FXNStatus {
    *dimensions = (*(value as *mut MockValue)).shape.len() as i32;
    FXN_OK
}

unsafe extern "C" fn value_get_shape(value: *mut FXNValue, shape: *mut i32, dimensions: i32) -> FXNStatus {
    let value = &*(value as *mut MockValue);
    if dimensions as usize != value.shape.len() {
        return FXN_ERROR_INVALID_ARGUMENT;
    }
    ptr::copy_nonoverlapping(value.shape.as_ptr(), shape, value.shape.len());
    FXN_OK
}

unsafe extern "C" fn value_create_array(
    data: *mut c_void,
    shape: *const i32,
    dimensions: i32,
    dtype: FXNDtype,
    flags: FXNValueFlags,
    value: *mut *mut FXNValue,
) -> FXNStatus {
    let Ok(dtype) = Dtype::from_raw(dtype) else {
        return FXN_ERROR_INVALID_ARGUMENT;
    };
    let Some(element_size) = dtype.element_size() else {
        return FXN_ERROR_INVALID_ARGUMENT;
    };
    if flags & FXN_VALUE_FLAG_COPY_DATA == 0 {
        return FXN_ERROR_NOT_IMPLEMENTED;
    }
    let shape = if dimensions > 0 {
        std::slice::from_raw_parts(shape, dimensions as usize).to_vec()
    } else {
        Vec::new()
    };
    let len = shape.iter().map(|&d| d as usize).product::<usize>() * element_size;
    let bytes = if len > 0 {
        std::slice::from_raw_parts(data as *const u8, len).to_vec()
    } else {
        Vec::new()
    };
    emit(MockValue::new(dtype, bytes, shape), value)
}

unsafe extern "C" fn value_create_string(data: *const c_char, value: *mut *mut FXNValue) -> FXNStatus {
    emit(MockValue::text(Dtype::String, data), value)
}

unsafe extern "C" fn value_create_list(data: *const c_char, value: *mut *mut FXNValue) -> FXNStatus {
    emit(MockValue::text(Dtype::List, data), value)
}

unsafe extern "C" fn value_create_dict(data: *const c_char, value: *mut *mut FXNValue) -> FXNStatus {
    emit(MockValue::text(Dtype::Dict, data), value)
}

unsafe extern "C" fn value_create_image(
    pixels: *const u8,
    width: i32,
    height: i32,
    channels: i32,
    _flags: FXNValueFlags,
    value: *mut *mut FXNValue,
) -> FXNStatus {
    let len = (width * height * channels) as usize;
    let data = std::slice::from_raw_parts(pixels, len).to_vec();
    emit(MockValue::new(Dtype::Image, data, vec![height, width, channels]), value)
}

unsafe extern "C" fn value_create_binary(
    buffer: *mut c_void,
    buffer_len: i32,
    _flags: FXNValueFlags,
    value: *mut *mut FXNValue,
) -> FXNStatus {
    let data = if buffer_len > 0 {
        std::slice::from_raw_parts(buffer as *const u8, buffer_len as usize).to_vec()
    } else {
        Vec::new()
    };
    emit(MockValue::new(Dtype::Binary, data, vec![buffer_len]), value)
}

unsafe extern "C" fn value_create_null(value: *mut *mut FXNValue) -> FXNStatus {
    emit(MockValue::new(Dtype::Null, Vec::new(), Vec::new()), value)
}

// ============================================================================
// Value maps
// ============================================================================

unsafe extern "C" fn value_map_create(map: *mut *mut FXNValueMap) -> FXNStatus {
    emit(MockMap::new(), map)
}

unsafe extern "C" fn value_map_release(map: *mut FXNValueMap) -> FXNStatus {
    if map.is_null() {
        return FXN_ERROR_INVALID_ARGUMENT;
    }
    drop(Box::from_raw(map as *mut MockMap));
    FXN_OK
}

unsafe extern "C" fn value_map_get_size(map: *mut FXNValueMap, size: *mut i32) -> FXNStatus {
    *size = (*(map as *mut MockMap)).entries.len() as i32;
    FXN_OK
}

unsafe extern "C" fn value_map_get_key(map: *mut FXNValueMap, index: i32, key: *mut c_char, size: i32) -> FXNStatus {
    let map = &*(map as *mut MockMap);
    match map.entries.get(index as usize) {
        Some((name, _)) => write_string(name, key, size),
        None => FXN_ERROR_INVALID_ARGUMENT,
    }
}

unsafe extern "C" fn value_map_get_value(
    map: *mut FXNValueMap,
    key: *const c_char,
    value: *mut *mut FXNValue,
) -> FXNStatus {
    let map = &mut *(map as *mut MockMap);
    let Some(key) = read_string(key) else {
        return FXN_ERROR_INVALID_ARGUMENT;
    };
    match map.entries.iter_mut().find(|(name, _)| *name == key) {
        Some((_, entry)) => {
            *value = entry.as_mut() as *mut MockValue as *mut FXNValue;
            FXN_OK
        }
        None => FXN_ERROR_INVALID_ARGUMENT,
    }
}

unsafe extern "C" fn value_map_set_value(map: *mut FXNValueMap, key: *const c_char, value: *mut FXNValue) -> FXNStatus {
    let map = &mut *(map as *mut MockMap);
    let Some(key) = read_string(key) else {
        return FXN_ERROR_INVALID_ARGUMENT;
    };
    let value = Box::from_raw(value as *mut MockValue);
    match map.entries.iter_mut().find(|(name, _)| *name == key) {
        Some((_, entry)) => *entry = value,
        None => map.entries.push((key, value)),
    }
    FXN_OK
}

// ============================================================================
// Configuration
// ============================================================================

unsafe extern "C" fn configuration_get_unique_id(id: *mut c_char, size: i32) -> FXNStatus {
    write_string(CONFIGURATION_ID, id, size)
}

unsafe extern "C" fn configuration_get_client_id(id: *mut c_char, size: i32) -> FXNStatus {
    write_string(CLIENT_ID, id, size)
}

unsafe extern "C" fn configuration_create(configuration: *mut *mut FXNConfiguration) -> FXNStatus {
    let object = Box::new(MockConfiguration {
        snapshot: ConfigurationSnapshot::default(),
        device: ptr::null_mut(),
        _live: Live::new(),
    });
    emit(object, configuration)
}

unsafe extern "C" fn configuration_release(configuration: *mut FXNConfiguration) -> FXNStatus {
    if configuration.is_null() {
        return FXN_ERROR_INVALID_ARGUMENT;
    }
    drop(Box::from_raw(configuration as *mut MockConfiguration));
    FXN_OK
}

unsafe fn configuration<'a>(configuration: *mut FXNConfiguration) -> &'a mut MockConfiguration {
    &mut *(configuration as *mut MockConfiguration)
}

unsafe extern "C" fn configuration_get_tag(c: *mut FXNConfiguration, tag: *mut c_char, size: i32) -> FXNStatus {
    write_string(&configuration(c).snapshot.tag, tag, size)
}

unsafe extern "C" fn configuration_set_tag(c: *mut FXNConfiguration, tag: *const c_char) -> FXNStatus {
    configuration(c).snapshot.tag = read_string(tag).unwrap_or_default();
    FXN_OK
}

unsafe extern "C" fn configuration_get_token(c: *mut FXNConfiguration, token: *mut c_char, size: i32) -> FXNStatus {
    write_string(&configuration(c).snapshot.token, token, size)
}

unsafe extern "C" fn configuration_set_token(c: *mut FXNConfiguration, token: *const c_char) -> FXNStatus {
    configuration(c).snapshot.token = read_string(token).unwrap_or_default();
    FXN_OK
}

unsafe extern "C" fn configuration_get_acceleration(c: *mut FXNConfiguration, acceleration: *mut FXNAcceleration) -> FXNStatus {
    *acceleration = configuration(c).snapshot.acceleration;
    FXN_OK
}

unsafe extern "C" fn configuration_set_acceleration(c: *mut FXNConfiguration, acceleration: FXNAcceleration) -> FXNStatus {
    configuration(c).snapshot.acceleration = acceleration;
    FXN_OK
}

unsafe extern "C" fn configuration_get_device(c: *mut FXNConfiguration, device: *mut *mut c_void) -> FXNStatus {
    *device = configuration(c).device;
    FXN_OK
}

unsafe extern "C" fn configuration_set_device(c: *mut FXNConfiguration, device: *mut c_void) -> FXNStatus {
    configuration(c).device = device;
    FXN_OK
}

unsafe extern "C" fn configuration_add_resource(
    c: *mut FXNConfiguration,
    resource_type: *const c_char,
    path: *const c_char,
) -> FXNStatus {
    let (Some(resource_type), Some(path)) = (read_string(resource_type), read_string(path)) else {
        return FXN_ERROR_INVALID_ARGUMENT;
    };
    configuration(c).snapshot.resources.push((resource_type, path));
    FXN_OK
}

// ============================================================================
// Predictions and streams
// ============================================================================

unsafe fn prediction<'a>(prediction: *mut FXNPrediction) -> &'a mut MockPrediction {
    &mut *(prediction as *mut MockPrediction)
}

unsafe extern "C" fn prediction_release(p: *mut FXNPrediction) -> FXNStatus {
    if p.is_null() {
        return FXN_ERROR_INVALID_ARGUMENT;
    }
    drop(Box::from_raw(p as *mut MockPrediction));
    FXN_OK
}

unsafe extern "C" fn prediction_get_id(p: *mut FXNPrediction, id: *mut c_char, size: i32) -> FXNStatus {
    write_string(&prediction(p).id, id, size)
}

unsafe extern "C" fn prediction_get_latency(p: *mut FXNPrediction, latency: *mut c_double) -> FXNStatus {
    *latency = prediction(p).latency;
    FXN_OK
}

unsafe extern "C" fn prediction_get_results(p: *mut FXNPrediction, results: *mut *mut FXNValueMap) -> FXNStatus {
    *results = match prediction(p).results.as_mut() {
        Some(map) => map.as_mut() as *mut MockMap as *mut FXNValueMap,
        None => ptr::null_mut(),
    };
    FXN_OK
}

unsafe extern "C" fn prediction_get_error(p: *mut FXNPrediction, error: *mut c_char, size: i32) -> FXNStatus {
    match &prediction(p).error {
        Some(message) => write_string(message, error, size),
        None => FXN_ERROR_INVALID_OPERATION,
    }
}

unsafe extern "C" fn prediction_get_logs(p: *mut FXNPrediction, logs: *mut c_char, size: i32) -> FXNStatus {
    write_string(prediction(p).logs.as_deref().unwrap_or(""), logs, size)
}

unsafe extern "C" fn prediction_get_log_length(p: *mut FXNPrediction, length: *mut i32) -> FXNStatus {
    *length = prediction(p).logs.as_ref().map_or(0, |logs| logs.len() as i32);
    FXN_OK
}

unsafe extern "C" fn prediction_stream_release(stream: *mut FXNPredictionStream) -> FXNStatus {
    if stream.is_null() {
        return FXN_ERROR_INVALID_ARGUMENT;
    }
    drop(Box::from_raw(stream as *mut MockStream));
    FXN_OK
}

unsafe extern "C" fn prediction_stream_read_next(
    stream: *mut FXNPredictionStream,
    prediction: *mut *mut FXNPrediction,
) -> FXNStatus {
    let stream = &mut *(stream as *mut MockStream);
    if stream.produced == STREAM_LENGTH {
        return FXN_ERROR_INVALID_OPERATION;
    }
    let next = predict(&stream.tag, &stream.inputs, stream.produced);
    stream.produced += 1;
    emit(next, prediction)
}

// ============================================================================
// Predictors
// ============================================================================

unsafe extern "C" fn predictor_create(c: *mut FXNConfiguration, predictor: *mut *mut FXNPredictor) -> FXNStatus {
    let snapshot = configuration(c).snapshot.clone();
    if snapshot.tag.is_empty() {
        return FXN_ERROR_INVALID_ARGUMENT;
    }
    PREDICTORS_CREATED.with(|count| count.set(count.get() + 1));
    let tag = snapshot.tag.clone();
    LAST_CONFIGURATION.with(|last| *last.borrow_mut() = Some(snapshot));
    emit(Box::new(MockPredictor { tag, _live: Live::new() }), predictor)
}

unsafe extern "C" fn predictor_release(predictor: *mut FXNPredictor) -> FXNStatus {
    if predictor.is_null() {
        return FXN_ERROR_INVALID_ARGUMENT;
    }
    drop(Box::from_raw(predictor as *mut MockPredictor));
    FXN_OK
}

unsafe extern "C" fn predictor_create_prediction(
    predictor: *mut FXNPredictor,
    inputs: *mut FXNValueMap,
    prediction: *mut *mut FXNPrediction,
) -> FXNStatus {
    let predictor = &*(predictor as *mut MockPredictor);
    let inputs = &*(inputs as *mut MockMap);
    emit(predict(&predictor.tag, inputs, 0), prediction)
}

unsafe extern "C" fn predictor_stream_prediction(
    predictor: *mut FXNPredictor,
    inputs: *mut FXNValueMap,
    stream: *mut *mut FXNPredictionStream,
) -> FXNStatus {
    let predictor = &*(predictor as *mut MockPredictor);
    let inputs = &*(inputs as *mut MockMap);
    let object = Box::new(MockStream {
        tag: predictor.tag.clone(),
        inputs: inputs.duplicate(),
        produced: 0,
        _live: Live::new(),
    });
    emit(object, stream)
}

unsafe extern "C" fn get_version() -> *const c_char {
    c"0.0.0-mock".as_ptr()
}

pub fn table() -> FunctionTable {
    FunctionTable {
        value_release,
        value_get_data,
        value_get_type,
        value_get_dimensions,
        value_get_shape,
        value_create_array,
        value_create_string,
        value_create_list,
        value_create_dict,
        value_create_image,
        value_create_binary,
        value_create_null,
        value_map_create,
        value_map_release,
        value_map_get_size,
        value_map_get_key,
        value_map_get_value,
        value_map_set_value,
        configuration_get_unique_id,
        configuration_get_client_id,
        configuration_create,
        configuration_release,
        configuration_get_tag,
        configuration_set_tag,
        configuration_get_token,
        configuration_set_token,
        configuration_get_acceleration,
        configuration_set_acceleration,
        configuration_get_device,
        configuration_set_device,
        configuration_add_resource,
        prediction_release,
        prediction_get_id,
        prediction_get_latency,
        prediction_get_results,
        prediction_get_error,
        prediction_get_logs,
        prediction_get_log_length,
        prediction_stream_release,
        prediction_stream_read_next,
        predictor_create,
        predictor_release,
        predictor_create_prediction,
        predictor_stream_prediction,
        get_version,
    }
}
