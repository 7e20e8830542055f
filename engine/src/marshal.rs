//! Conversion between application values and native engine values.

use std::os::raw::c_void;
use std::sync::Arc;

use fxn_values::codec::{self, decode_numeric};
use fxn_values::serde_json::{self, Value as JsonValue};
use fxn_values::tensor::element_count;
use fxn_values::{Dtype, Image, Value, ValueError, ValueMap};

use crate::error::{EngineError, Result};
use crate::ffi::FXN_VALUE_FLAG_COPY_DATA;
use crate::handle::{c_string, value_from_raw, ValueHandle, ValueMapHandle, ValueMapRef, ValueRef};
use crate::library::Engine;

const CONTEXT: &str = "local predictions";

/// Create a native value for `value`.
///
/// Numeric, image and binary buffers are always copied into the engine, so
/// the returned handle never borrows from `value`.
pub fn to_engine_value(engine: &Arc<Engine>, value: &Value) -> Result<ValueHandle> {
    let table = engine.table();

    if let Some(buffer) = codec::numeric_buffer(value) {
        let shape = buffer
            .shape
            .iter()
            .map(|&d| i32::try_from(d).map_err(|_| too_large("tensor dimension", d)))
            .collect::<Result<Vec<i32>>>()?;
        let dims = shape.len() as i32;
        let data = buffer.bytes.as_ptr() as *mut c_void;
        return value_from_raw(engine, "FXNValueCreateArray", |out| {
            // SAFETY: `data` holds product(shape) elements of `dtype` and
            // `shape` holds `dims` entries; the engine copies both.
            unsafe {
                (table.value_create_array)(
                    data,
                    shape.as_ptr(),
                    dims,
                    buffer.dtype as i32,
                    FXN_VALUE_FLAG_COPY_DATA,
                    out,
                )
            }
        });
    }

    match value {
        Value::Null => value_from_raw(engine, "FXNValueCreateNull", |out| {
            // SAFETY: out-pointer is valid for the call.
            unsafe { (table.value_create_null)(out) }
        }),
        Value::String(s) => create_text(engine, "FXNValueCreateString", table.value_create_string, s),
        Value::Enum(member) => match member.alias() {
            Some(alias) => create_text(engine, "FXNValueCreateString", table.value_create_string, alias),
            None => to_engine_value(engine, &member.resolve()),
        },
        Value::List(items) => {
            let json = serde_json::to_string(items).map_err(ValueError::from)?;
            create_text(engine, "FXNValueCreateList", table.value_create_list, &json)
        }
        Value::Dict(map) => {
            let json = serde_json::to_string(map).map_err(ValueError::from)?;
            create_text(engine, "FXNValueCreateDict", table.value_create_dict, &json)
        }
        Value::Image(image) => {
            let width = i32::try_from(image.width()).map_err(|_| too_large("image width", image.width()))?;
            let height = i32::try_from(image.height()).map_err(|_| too_large("image height", image.height()))?;
            let channels = image.channels() as i32;
            value_from_raw(engine, "FXNValueCreateImage", |out| {
                // SAFETY: `data` holds width * height * channels bytes; the
                // engine copies them.
                unsafe {
                    (table.value_create_image)(
                        image.data().as_ptr(),
                        width,
                        height,
                        channels,
                        FXN_VALUE_FLAG_COPY_DATA,
                        out,
                    )
                }
            })
        }
        Value::Binary(bytes) => {
            let len = i32::try_from(bytes.len()).map_err(|_| too_large("binary length", bytes.len()))?;
            value_from_raw(engine, "FXNValueCreateBinary", |out| {
                // SAFETY: `bytes` holds `len` bytes; the engine copies them.
                unsafe {
                    (table.value_create_binary)(bytes.as_ptr() as *mut c_void, len, FXN_VALUE_FLAG_COPY_DATA, out)
                }
            })
        }
        other => Err(ValueError::UnsupportedValueKind { dtype: other.dtype(), context: CONTEXT }.into()),
    }
}

/// Build a native input map. Each value is moved into the map as soon as it
/// is created, so a failure part-way through leaks nothing.
pub fn to_engine_map(engine: &Arc<Engine>, values: &ValueMap) -> Result<ValueMapHandle> {
    let mut map = ValueMapHandle::new(engine)?;
    for (key, value) in values {
        let handle = to_engine_value(engine, value).map_err(|e| EngineError::for_key(key, e))?;
        map.insert(key, handle).map_err(|e| EngineError::for_key(key, e))?;
    }
    Ok(map)
}

/// Copy a native value into an application value.
///
/// All data is copied out before returning, so the result does not depend on
/// the native value staying alive.
pub fn from_engine_value(value: ValueRef<'_>) -> Result<Value> {
    let dtype = value.dtype()?;
    match dtype {
        Dtype::Null => Ok(Value::Null),
        numeric if numeric.is_numeric() => {
            let shape = value.shape()?;
            let size = numeric.element_size().unwrap_or(1);
            let len = element_count(&shape)
                .and_then(|n| n.checked_mul(size))
                .ok_or_else(|| too_large("tensor element count", usize::MAX))?;
            let bytes = value.copy_bytes(len)?;
            Ok(decode_numeric(numeric, &bytes, &shape)?)
        }
        Dtype::String => Ok(Value::String(value.read_c_string()?)),
        Dtype::List => match parse_json(&value.read_c_string()?)? {
            JsonValue::Array(items) => Ok(Value::List(items)),
            _ => Err(invalid_json("list")),
        },
        Dtype::Dict => match parse_json(&value.read_c_string()?)? {
            JsonValue::Object(map) => Ok(Value::Dict(map)),
            _ => Err(invalid_json("dict")),
        },
        Dtype::Image => {
            let shape = value.shape()?;
            let &[height, width, channels] = shape.as_slice() else {
                return Err(EngineError::Value(ValueError::InvalidImage {
                    message: format!("expected (height, width, channels) shape, got {:?}", shape),
                }));
            };
            let len = element_count(&shape).ok_or_else(|| too_large("image size", usize::MAX))?;
            let bytes = value.copy_bytes(len)?;
            Ok(Value::Image(Image::new(bytes, width, height, channels)?))
        }
        Dtype::Binary => {
            let len = value.shape()?.first().copied().unwrap_or(0);
            Ok(Value::Binary(value.copy_bytes(len)?.into()))
        }
        other => Err(ValueError::UnsupportedValueKind { dtype: other, context: CONTEXT }.into()),
    }
}

/// Copy every entry of a native map, preserving engine key order.
pub fn from_engine_map(map: ValueMapRef<'_>) -> Result<ValueMap> {
    let mut values = ValueMap::new();
    for key in map.keys()? {
        let value = map
            .get(&key)
            .and_then(from_engine_value)
            .map_err(|e| EngineError::for_key(&key, e))?;
        values.insert(key, value);
    }
    Ok(values)
}

type TextConstructor = unsafe extern "C" fn(
    *const std::os::raw::c_char,
    *mut *mut crate::ffi::FXNValue,
) -> crate::ffi::FXNStatus;

fn create_text(
    engine: &Arc<Engine>,
    operation: &'static str,
    constructor: TextConstructor,
    text: &str,
) -> Result<ValueHandle> {
    let text = c_string("string value", text)?;
    value_from_raw(engine, operation, |out| {
        // SAFETY: `text` is NUL-terminated; the engine copies it.
        unsafe { constructor(text.as_ptr(), out) }
    })
}

fn parse_json(text: &str) -> Result<JsonValue> {
    serde_json::from_str(text)
        .map_err(|e| EngineError::Value(ValueError::DeserializationError(e.to_string())))
}

fn invalid_json(kind: &str) -> EngineError {
    EngineError::Value(ValueError::DeserializationError(format!(
        "engine {} value is not a JSON {}",
        kind,
        if kind == "list" { "array" } else { "object" }
    )))
}

fn too_large(what: &str, size: usize) -> EngineError {
    EngineError::Value(ValueError::InvalidValue {
        message: format!("{} {} exceeds the engine limit", what, size),
    })
}
