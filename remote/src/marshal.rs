//! Conversion between application values and remote wire values.

use std::sync::Arc;

use bytes::Bytes;
use fxn_values::codec::{decode_numeric, numeric_buffer};
use fxn_values::serde_json::{self, Value as JsonValue};
use fxn_values::wire::mime;
use fxn_values::{Dtype, Value, ValueError, WireValue};

use crate::error::RemoteResult;
use crate::storage::StorageService;

const CONTEXT: &str = "remote predictions";

/// Marshals values for the remote prediction service.
pub struct RemoteMarshaller {
    storage: Arc<StorageService>,
}

impl RemoteMarshaller {
    pub fn new(storage: Arc<StorageService>) -> Self {
        Self { storage }
    }

    /// Convert `value` into a wire value named `name`.
    ///
    /// Payloads smaller than `max_inline_size` bytes are inlined as `data:`
    /// URLs; larger ones are uploaded.
    pub async fn to_wire_value(
        &self,
        value: &Value,
        name: &str,
        max_inline_size: usize,
    ) -> RemoteResult<WireValue> {
        let resolved;
        let value = match value {
            Value::Enum(member) => {
                resolved = member.resolve();
                &resolved
            }
            other => other,
        };

        if let Some(buffer) = numeric_buffer(value) {
            let data = Bytes::from(buffer.bytes.into_owned());
            let url = self.storage.upload(name, data, mime::OCTET_STREAM, max_inline_size).await?;
            return Ok(WireValue {
                data: Some(url),
                dtype: buffer.dtype,
                shape: Some(buffer.shape),
            });
        }

        let (dtype, data, content_type) = match value {
            Value::Null => return Ok(WireValue::null()),
            Value::String(s) => (Dtype::String, Bytes::from(s.clone()), mime::TEXT_PLAIN),
            Value::List(items) => (Dtype::List, to_json_bytes(items)?, mime::APPLICATION_JSON),
            Value::Dict(map) => (Dtype::Dict, to_json_bytes(map)?, mime::APPLICATION_JSON),
            Value::Binary(bytes) => (Dtype::Binary, bytes.clone(), mime::OCTET_STREAM),
            other => {
                return Err(ValueError::UnsupportedValueKind { dtype: other.dtype(), context: CONTEXT }.into());
            }
        };

        let url = self.storage.upload(name, data, content_type, max_inline_size).await?;
        Ok(WireValue { data: Some(url), dtype, shape: None })
    }

    /// Download and decode a wire value.
    pub async fn from_wire_value(&self, value: &WireValue) -> RemoteResult<Value> {
        match value.dtype {
            Dtype::Null => return Ok(Value::Null),
            Dtype::Image | Dtype::Audio | Dtype::Video => {
                return Err(ValueError::UnsupportedValueKind { dtype: value.dtype, context: CONTEXT }.into());
            }
            _ => {}
        }

        let url = value.data.as_deref().ok_or_else(|| ValueError::InvalidValue {
            message: format!("{} value has no data", value.dtype),
        })?;
        let data = self.storage.download(url).await?;

        let decoded = match value.dtype {
            numeric if numeric.is_numeric() => {
                let shape = value.shape.as_deref().unwrap_or(&[]);
                decode_numeric(numeric, &data, shape)?
            }
            Dtype::String => Value::String(to_text(&data)?),
            Dtype::List => match parse_json(&data)? {
                JsonValue::Array(items) => Value::List(items),
                _ => return Err(not_json("list", "array").into()),
            },
            Dtype::Dict => match parse_json(&data)? {
                JsonValue::Object(map) => Value::Dict(map),
                _ => return Err(not_json("dict", "object").into()),
            },
            Dtype::Binary => Value::Binary(data),
            other => return Err(ValueError::UnsupportedValueKind { dtype: other, context: CONTEXT }.into()),
        };
        Ok(decoded)
    }
}

fn to_json_bytes<T: serde::Serialize>(value: &T) -> RemoteResult<Bytes> {
    Ok(serde_json::to_vec(value).map_err(ValueError::from)?.into())
}

fn to_text(data: &[u8]) -> RemoteResult<String> {
    String::from_utf8(data.to_vec()).map_err(|e| {
        ValueError::DeserializationError(format!("string value is not UTF-8: {}", e)).into()
    })
}

fn parse_json(data: &[u8]) -> RemoteResult<JsonValue> {
    serde_json::from_slice(data).map_err(|e| ValueError::DeserializationError(e.to_string()).into())
}

fn not_json(kind: &str, expected: &str) -> ValueError {
    ValueError::DeserializationError(format!("{} value is not a JSON {}", kind, expected))
}
