//! Owning and borrowed wrappers around native engine objects.
//!
//! Every owned handle releases its native object exactly once in `Drop`.
//! Borrowed views (`ValueRef`, `ValueMapRef`) carry a lifetime tied to their
//! owner so they cannot outlive it. Release failures in `Drop` are logged,
//! never raised.

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::os::raw::{c_char, c_void};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;

use fxn_values::{Acceleration, Dtype, ValueError};

use crate::error::{EngineError, Result, Status};
use crate::ffi::{
    FXNConfiguration, FXNPrediction, FXNPredictionStream, FXNPredictor, FXNStatus, FXNValue,
    FXNValueMap,
};
use crate::library::{buffer_to_string, read_string, Engine, STRING_BUFFER_SIZE};

/// Call an engine constructor that returns its object through an out-pointer.
pub(crate) fn create<T>(
    operation: &'static str,
    f: impl FnOnce(*mut *mut T) -> FXNStatus,
) -> Result<NonNull<T>> {
    let mut raw: *mut T = ptr::null_mut();
    Status::check(f(&mut raw), operation)?;
    NonNull::new(raw).ok_or(EngineError::NullHandle { operation })
}

pub(crate) fn c_string(what: &str, s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| {
        EngineError::Value(ValueError::InvalidValue {
            message: format!("{} contains an interior NUL byte", what),
        })
    })
}

fn log_release(status: FXNStatus, operation: &'static str) {
    if let Err(e) = Status::check(status, operation) {
        log::warn!("{}", e);
    }
}

// ============================================================================
// Values
// ============================================================================

/// Owned native value.
pub struct ValueHandle {
    ptr: NonNull<FXNValue>,
    engine: Arc<Engine>,
}

impl ValueHandle {
    pub(crate) fn new(engine: &Arc<Engine>, ptr: NonNull<FXNValue>) -> Self {
        ValueHandle { ptr, engine: Arc::clone(engine) }
    }

    pub fn view(&self) -> ValueRef<'_> {
        ValueRef { ptr: self.ptr, engine: &self.engine, _owner: PhantomData }
    }

    /// Give up ownership without releasing the native value.
    fn into_raw(self) -> *mut FXNValue {
        let this = ManuallyDrop::new(self);
        this.ptr.as_ptr()
    }
}

impl Drop for ValueHandle {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from an FXNValueCreate* call and ownership was
        // never transferred, so this is the only release.
        let status = unsafe { (self.engine.table().value_release)(self.ptr.as_ptr()) };
        log_release(status, "FXNValueRelease");
    }
}

// SAFETY: the handle exclusively owns its native value and the engine's value
// functions are callable from any thread.
unsafe impl Send for ValueHandle {}

/// Borrowed native value. Valid for as long as its owner.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    ptr: NonNull<FXNValue>,
    engine: &'a Engine,
    _owner: PhantomData<&'a FXNValue>,
}

impl<'a> ValueRef<'a> {
    pub fn dtype(&self) -> Result<Dtype> {
        let mut raw = 0;
        // SAFETY: `ptr` is a live value for `'a`.
        let status = unsafe { (self.engine.table().value_get_type)(self.ptr.as_ptr(), &mut raw) };
        Status::check(status, "FXNValueGetType")?;
        Ok(Dtype::from_raw(raw)?)
    }

    pub fn shape(&self) -> Result<Vec<usize>> {
        let table = self.engine.table();
        let mut dims = 0i32;
        // SAFETY: `ptr` is a live value for `'a`.
        let status = unsafe { (table.value_get_dimensions)(self.ptr.as_ptr(), &mut dims) };
        Status::check(status, "FXNValueGetDimensions")?;
        let mut shape = vec![0i32; usize::try_from(dims).unwrap_or(0)];
        if !shape.is_empty() {
            // SAFETY: `shape` holds exactly `dims` writable elements.
            let status = unsafe { (table.value_get_shape)(self.ptr.as_ptr(), shape.as_mut_ptr(), dims) };
            Status::check(status, "FXNValueGetShape")?;
        }
        shape
            .into_iter()
            .map(|d| {
                usize::try_from(d).map_err(|_| {
                    EngineError::Value(ValueError::InvalidValue {
                        message: format!("negative dimension {} in value shape", d),
                    })
                })
            })
            .collect()
    }

    /// Raw data pointer. Valid for `'a`; may be null for empty values.
    pub fn data(&self) -> Result<*const c_void> {
        let mut data: *mut c_void = ptr::null_mut();
        // SAFETY: `ptr` is a live value for `'a`.
        let status = unsafe { (self.engine.table().value_get_data)(self.ptr.as_ptr(), &mut data) };
        Status::check(status, "FXNValueGetData")?;
        Ok(data as *const c_void)
    }

    /// Copy `len` bytes out of the value's data buffer.
    pub fn copy_bytes(&self, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let data = self.data()?;
        if data.is_null() {
            return Err(EngineError::NullHandle { operation: "FXNValueGetData" });
        }
        // SAFETY: the engine guarantees the buffer holds at least `len` bytes
        // for the value's dtype and shape, and it lives for `'a`.
        Ok(unsafe { std::slice::from_raw_parts(data as *const u8, len) }.to_vec())
    }

    /// Read the value's data as a NUL-terminated UTF-8 string.
    pub fn read_c_string(&self) -> Result<String> {
        let data = self.data()?;
        if data.is_null() {
            return Ok(String::new());
        }
        // SAFETY: string, list and dict values store NUL-terminated text.
        Ok(unsafe { CStr::from_ptr(data as *const c_char) }.to_string_lossy().into_owned())
    }
}

// ============================================================================
// Value maps
// ============================================================================

/// Owned native value map.
pub struct ValueMapHandle {
    ptr: NonNull<FXNValueMap>,
    engine: Arc<Engine>,
}

impl ValueMapHandle {
    pub fn new(engine: &Arc<Engine>) -> Result<Self> {
        // SAFETY: out-pointer is valid for the duration of the call.
        let ptr = create("FXNValueMapCreate", |out| unsafe { (engine.table().value_map_create)(out) })?;
        Ok(ValueMapHandle { ptr, engine: Arc::clone(engine) })
    }

    /// Move `value` into the map. The map owns it from here on.
    pub fn insert(&mut self, key: &str, value: ValueHandle) -> Result<()> {
        let key = c_string("value map key", key)?;
        // SAFETY: `key` is NUL-terminated and `value` is a live owned value.
        let status = unsafe {
            (self.engine.table().value_map_set_value)(self.ptr.as_ptr(), key.as_ptr(), value.view().ptr.as_ptr())
        };
        Status::check(status, "FXNValueMapSetValue")?;
        // Ownership moved into the native map; `value` must not release it.
        let _ = value.into_raw();
        Ok(())
    }

    pub fn view(&self) -> ValueMapRef<'_> {
        ValueMapRef { ptr: self.ptr, engine: &self.engine, _owner: PhantomData }
    }

    pub(crate) fn as_ptr(&self) -> *mut FXNValueMap {
        self.ptr.as_ptr()
    }
}

impl Drop for ValueMapHandle {
    fn drop(&mut self) {
        // SAFETY: the map is owned; releasing it also releases its values.
        let status = unsafe { (self.engine.table().value_map_release)(self.ptr.as_ptr()) };
        log_release(status, "FXNValueMapRelease");
    }
}

// SAFETY: exclusively owned native map.
unsafe impl Send for ValueMapHandle {}

/// Borrowed native value map.
#[derive(Clone, Copy)]
pub struct ValueMapRef<'a> {
    ptr: NonNull<FXNValueMap>,
    engine: &'a Engine,
    _owner: PhantomData<&'a FXNValueMap>,
}

impl<'a> ValueMapRef<'a> {
    pub fn len(&self) -> Result<usize> {
        let mut size = 0i32;
        // SAFETY: `ptr` is a live map for `'a`.
        let status = unsafe { (self.engine.table().value_map_get_size)(self.ptr.as_ptr(), &mut size) };
        Status::check(status, "FXNValueMapGetSize")?;
        Ok(usize::try_from(size).unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn key(&self, index: usize) -> Result<String> {
        let index = i32::try_from(index).map_err(|_| EngineError::Status {
            operation: "FXNValueMapGetKey",
            status: Status::InvalidArgument,
        })?;
        read_string("FXNValueMapGetKey", STRING_BUFFER_SIZE, |buf, size| {
            // SAFETY: `buf` is writable for `size` bytes.
            unsafe { (self.engine.table().value_map_get_key)(self.ptr.as_ptr(), index, buf, size) }
        })
    }

    /// Keys in engine order.
    pub fn keys(&self) -> Result<Vec<String>> {
        (0..self.len()?).map(|i| self.key(i)).collect()
    }

    /// Borrow the value stored under `key`. The map keeps ownership.
    pub fn get(&self, key: &str) -> Result<ValueRef<'a>> {
        let c_key = c_string("value map key", key)?;
        let ptr = create("FXNValueMapGetValue", |out| {
            // SAFETY: `c_key` is NUL-terminated and `ptr` is live for `'a`.
            unsafe { (self.engine.table().value_map_get_value)(self.ptr.as_ptr(), c_key.as_ptr(), out) }
        })?;
        Ok(ValueRef { ptr, engine: self.engine, _owner: PhantomData })
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Owned predictor configuration.
pub struct ConfigurationHandle {
    ptr: NonNull<FXNConfiguration>,
    engine: Arc<Engine>,
}

impl ConfigurationHandle {
    pub fn new(engine: &Arc<Engine>) -> Result<Self> {
        // SAFETY: out-pointer is valid for the duration of the call.
        let ptr = create("FXNConfigurationCreate", |out| unsafe {
            (engine.table().configuration_create)(out)
        })?;
        Ok(ConfigurationHandle { ptr, engine: Arc::clone(engine) })
    }

    pub fn tag(&self) -> Result<String> {
        read_string("FXNConfigurationGetTag", STRING_BUFFER_SIZE, |buf, size| {
            // SAFETY: `buf` is writable for `size` bytes.
            unsafe { (self.engine.table().configuration_get_tag)(self.ptr.as_ptr(), buf, size) }
        })
    }

    pub fn set_tag(&mut self, tag: &str) -> Result<()> {
        let tag = c_string("tag", tag)?;
        // SAFETY: `tag` is NUL-terminated; the engine copies it.
        let status = unsafe { (self.engine.table().configuration_set_tag)(self.ptr.as_ptr(), tag.as_ptr()) };
        Status::check(status, "FXNConfigurationSetTag")
    }

    pub fn token(&self) -> Result<String> {
        read_string("FXNConfigurationGetToken", STRING_BUFFER_SIZE, |buf, size| {
            // SAFETY: `buf` is writable for `size` bytes.
            unsafe { (self.engine.table().configuration_get_token)(self.ptr.as_ptr(), buf, size) }
        })
    }

    pub fn set_token(&mut self, token: &str) -> Result<()> {
        let token = c_string("configuration token", token)?;
        // SAFETY: `token` is NUL-terminated; the engine copies it.
        let status = unsafe { (self.engine.table().configuration_set_token)(self.ptr.as_ptr(), token.as_ptr()) };
        Status::check(status, "FXNConfigurationSetToken")
    }

    pub fn acceleration(&self) -> Result<Acceleration> {
        let mut raw = 0;
        // SAFETY: out-pointer is valid for the duration of the call.
        let status = unsafe { (self.engine.table().configuration_get_acceleration)(self.ptr.as_ptr(), &mut raw) };
        Status::check(status, "FXNConfigurationGetAcceleration")?;
        match raw {
            0 => Ok(Acceleration::Auto),
            1 => Ok(Acceleration::Cpu),
            2 => Ok(Acceleration::Gpu),
            4 => Ok(Acceleration::Npu),
            other => Err(EngineError::Ffi(format!("unknown acceleration {}", other))),
        }
    }

    pub fn set_acceleration(&mut self, acceleration: Acceleration) -> Result<()> {
        // SAFETY: plain integer argument.
        let status = unsafe {
            (self.engine.table().configuration_set_acceleration)(self.ptr.as_ptr(), acceleration as i32)
        };
        Status::check(status, "FXNConfigurationSetAcceleration")
    }

    /// Native device handle previously set, or null.
    pub fn device(&self) -> Result<*mut c_void> {
        let mut device = ptr::null_mut();
        // SAFETY: out-pointer is valid for the duration of the call.
        let status = unsafe { (self.engine.table().configuration_get_device)(self.ptr.as_ptr(), &mut device) };
        Status::check(status, "FXNConfigurationGetDevice")?;
        Ok(device)
    }

    /// Set the native device the predictor should run on.
    ///
    /// # Safety
    /// `device` must be null or a device handle the engine accepts, and must
    /// outlive every predictor created from this configuration.
    pub unsafe fn set_device(&mut self, device: *mut c_void) -> Result<()> {
        let status = (self.engine.table().configuration_set_device)(self.ptr.as_ptr(), device);
        Status::check(status, "FXNConfigurationSetDevice")
    }

    /// Register a provisioned resource file.
    pub fn add_resource(&mut self, resource_type: &str, path: &Path) -> Result<()> {
        let resource_type = c_string("resource type", resource_type)?;
        let path = c_string("resource path", &path.to_string_lossy())?;
        // SAFETY: both strings are NUL-terminated; the engine copies them.
        let status = unsafe {
            (self.engine.table().configuration_add_resource)(self.ptr.as_ptr(), resource_type.as_ptr(), path.as_ptr())
        };
        Status::check(status, "FXNConfigurationAddResource")
    }
}

impl Drop for ConfigurationHandle {
    fn drop(&mut self) {
        // SAFETY: owned configuration, released once.
        let status = unsafe { (self.engine.table().configuration_release)(self.ptr.as_ptr()) };
        log_release(status, "FXNConfigurationRelease");
    }
}

// ============================================================================
// Predictors, predictions and streams
// ============================================================================

/// Owned native predictor.
pub struct PredictorHandle {
    ptr: NonNull<FXNPredictor>,
    engine: Arc<Engine>,
}

impl PredictorHandle {
    pub fn new(engine: &Arc<Engine>, configuration: &ConfigurationHandle) -> Result<Self> {
        // SAFETY: `configuration` is live for the call; the engine copies what it needs.
        let ptr = create("FXNPredictorCreate", |out| unsafe {
            (engine.table().predictor_create)(configuration.ptr.as_ptr(), out)
        })?;
        Ok(PredictorHandle { ptr, engine: Arc::clone(engine) })
    }

    pub fn create_prediction(&self, inputs: &ValueMapHandle) -> Result<PredictionHandle> {
        // SAFETY: predictor and input map are live; inputs stay owned by the caller.
        let ptr = create("FXNPredictorCreatePrediction", |out| unsafe {
            (self.engine.table().predictor_create_prediction)(self.ptr.as_ptr(), inputs.as_ptr(), out)
        })?;
        Ok(PredictionHandle { ptr, engine: Arc::clone(&self.engine) })
    }

    pub fn stream_prediction(&self, inputs: &ValueMapHandle) -> Result<PredictionStreamHandle> {
        // SAFETY: predictor and input map are live; inputs stay owned by the caller.
        let ptr = create("FXNPredictorStreamPrediction", |out| unsafe {
            (self.engine.table().predictor_stream_prediction)(self.ptr.as_ptr(), inputs.as_ptr(), out)
        })?;
        Ok(PredictionStreamHandle { ptr, engine: Arc::clone(&self.engine) })
    }
}

impl Drop for PredictorHandle {
    fn drop(&mut self) {
        // SAFETY: owned predictor, released once.
        let status = unsafe { (self.engine.table().predictor_release)(self.ptr.as_ptr()) };
        log_release(status, "FXNPredictorRelease");
    }
}

// SAFETY: the predictor is only driven through `&self` behind a mutex held by
// its owner; the pointer itself may move between threads.
unsafe impl Send for PredictorHandle {}

/// Owned native prediction.
pub struct PredictionHandle {
    ptr: NonNull<FXNPrediction>,
    engine: Arc<Engine>,
}

impl PredictionHandle {
    pub fn id(&self) -> Result<String> {
        read_string("FXNPredictionGetID", STRING_BUFFER_SIZE, |buf, size| {
            // SAFETY: `buf` is writable for `size` bytes.
            unsafe { (self.engine.table().prediction_get_id)(self.ptr.as_ptr(), buf, size) }
        })
    }

    /// Latency in milliseconds.
    pub fn latency(&self) -> Result<f64> {
        let mut latency = 0.0;
        // SAFETY: out-pointer is valid for the duration of the call.
        let status = unsafe { (self.engine.table().prediction_get_latency)(self.ptr.as_ptr(), &mut latency) };
        Status::check(status, "FXNPredictionGetLatency")?;
        Ok(latency)
    }

    /// Result map, owned by this prediction. `None` when the engine has none.
    pub fn results(&self) -> Result<Option<ValueMapRef<'_>>> {
        let mut map: *mut FXNValueMap = ptr::null_mut();
        // SAFETY: out-pointer is valid for the duration of the call.
        let status = unsafe { (self.engine.table().prediction_get_results)(self.ptr.as_ptr(), &mut map) };
        Status::check(status, "FXNPredictionGetResults")?;
        Ok(NonNull::new(map).map(|ptr| ValueMapRef { ptr, engine: &self.engine, _owner: PhantomData }))
    }

    /// Error message, if the prediction failed.
    pub fn error(&self) -> Result<Option<String>> {
        let mut buffer = vec![0u8; STRING_BUFFER_SIZE];
        // SAFETY: `buffer` is writable for its full length.
        let status = unsafe {
            (self.engine.table().prediction_get_error)(
                self.ptr.as_ptr(),
                buffer.as_mut_ptr() as *mut c_char,
                STRING_BUFFER_SIZE as i32,
            )
        };
        // The engine reports "no error" as InvalidOperation.
        if Status::from_raw(status) == Status::InvalidOperation {
            return Ok(None);
        }
        Status::check(status, "FXNPredictionGetError")?;
        let message = buffer_to_string(&buffer);
        Ok((!message.is_empty()).then_some(message))
    }

    /// Prediction logs, if any were captured.
    pub fn logs(&self) -> Result<Option<String>> {
        let mut length = 0i32;
        // SAFETY: out-pointer is valid for the duration of the call.
        let status = unsafe { (self.engine.table().prediction_get_log_length)(self.ptr.as_ptr(), &mut length) };
        Status::check(status, "FXNPredictionGetLogLength")?;
        let length = usize::try_from(length).unwrap_or(0);
        if length == 0 {
            return Ok(None);
        }
        let logs = read_string("FXNPredictionGetLogs", length + 1, |buf, size| {
            // SAFETY: `buf` is writable for `size` bytes.
            unsafe { (self.engine.table().prediction_get_logs)(self.ptr.as_ptr(), buf, size) }
        })?;
        Ok(Some(logs))
    }
}

impl Drop for PredictionHandle {
    fn drop(&mut self) {
        // SAFETY: owned prediction, released once. Its result map goes with it.
        let status = unsafe { (self.engine.table().prediction_release)(self.ptr.as_ptr()) };
        log_release(status, "FXNPredictionRelease");
    }
}

// SAFETY: exclusively owned native prediction.
unsafe impl Send for PredictionHandle {}

/// Owned native prediction stream.
pub struct PredictionStreamHandle {
    ptr: NonNull<FXNPredictionStream>,
    engine: Arc<Engine>,
}

impl PredictionStreamHandle {
    /// Next prediction, or `None` once the stream is exhausted.
    pub fn read_next(&mut self) -> Result<Option<PredictionHandle>> {
        let mut raw: *mut FXNPrediction = ptr::null_mut();
        // SAFETY: out-pointer is valid for the duration of the call.
        let status = unsafe { (self.engine.table().prediction_stream_read_next)(self.ptr.as_ptr(), &mut raw) };
        if Status::from_raw(status) == Status::InvalidOperation {
            return Ok(None);
        }
        Status::check(status, "FXNPredictionStreamReadNext")?;
        let ptr = NonNull::new(raw).ok_or(EngineError::NullHandle {
            operation: "FXNPredictionStreamReadNext",
        })?;
        Ok(Some(PredictionHandle { ptr, engine: Arc::clone(&self.engine) }))
    }
}

impl Drop for PredictionStreamHandle {
    fn drop(&mut self) {
        // SAFETY: owned stream, released once.
        let status = unsafe { (self.engine.table().prediction_stream_release)(self.ptr.as_ptr()) };
        log_release(status, "FXNPredictionStreamRelease");
    }
}

// SAFETY: exclusively owned native stream.
unsafe impl Send for PredictionStreamHandle {}

/// Wrap a freshly created value pointer.
pub(crate) fn value_from_raw(
    engine: &Arc<Engine>,
    operation: &'static str,
    f: impl FnOnce(*mut *mut FXNValue) -> FXNStatus,
) -> Result<ValueHandle> {
    create(operation, f).map(|ptr| ValueHandle::new(engine, ptr))
}
