//! Remote wire form of a value and `data:` URL helpers.
//!
//! ```json
//! { "data": "data:text/plain;base64,aGk=", "type": "string", "shape": null }
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::dtype::Dtype;
use crate::error::{ValueError, ValueResult};

/// MIME types attached to uploaded payloads.
pub mod mime {
    pub const TEXT_PLAIN: &str = "text/plain";
    pub const APPLICATION_JSON: &str = "application/json";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// A value as exchanged with the remote service.
///
/// `data` is either a `data:` URL or an HTTP(S) URL. It is absent only for
/// `null` values. `shape` is present for numeric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWireValue")]
pub struct WireValue {
    pub data: Option<String>,
    #[serde(rename = "type")]
    pub dtype: Dtype,
    pub shape: Option<Vec<usize>>,
}

/// Wire value with the type tag still unparsed, so unknown tags surface as
/// [`ValueError::UnknownDtype`] instead of a generic serde error.
#[derive(Deserialize)]
struct RawWireValue {
    #[serde(default)]
    data: Option<String>,
    #[serde(rename = "type")]
    dtype: String,
    #[serde(default)]
    shape: Option<Vec<usize>>,
}

impl TryFrom<RawWireValue> for WireValue {
    type Error = ValueError;

    fn try_from(raw: RawWireValue) -> Result<Self, Self::Error> {
        Ok(WireValue {
            data: raw.data,
            dtype: raw.dtype.parse()?,
            shape: raw.shape,
        })
    }
}

impl WireValue {
    pub fn null() -> Self {
        WireValue { data: None, dtype: Dtype::Null, shape: None }
    }

    /// Parse a wire value, keeping dtype failures typed.
    pub fn from_json(json: serde_json::Value) -> ValueResult<Self> {
        let raw: RawWireValue = serde_json::from_value(json)
            .map_err(|e| ValueError::DeserializationError(e.to_string()))?;
        WireValue::try_from(raw)
    }
}

/// Encode bytes as `data:{mime};base64,{payload}`.
///
/// # Example
///
/// ```rust
/// use fxn_values::wire::encode_data_url;
///
/// let url = encode_data_url(b"hello world", Some("text/plain"));
/// assert_eq!(url, "data:text/plain;base64,aGVsbG8gd29ybGQ=");
/// ```
pub fn encode_data_url(bytes: &[u8], mime: Option<&str>) -> String {
    format!(
        "data:{};base64,{}",
        mime.unwrap_or(mime::OCTET_STREAM),
        STANDARD.encode(bytes)
    )
}

/// Whether `url` uses the `data:` scheme.
pub fn is_data_url(url: &str) -> bool {
    url.starts_with("data:")
}

/// Decode the payload of a base64 `data:` URL.
///
/// The payload starts after the last comma.
pub fn decode_data_url(url: &str) -> ValueResult<Vec<u8>> {
    if !is_data_url(url) {
        return Err(ValueError::InvalidDataUrl {
            message: "missing data: scheme".to_string(),
        });
    }
    let comma = url.rfind(',').ok_or_else(|| ValueError::InvalidDataUrl {
        message: "missing payload separator".to_string(),
    })?;
    STANDARD
        .decode(&url[comma + 1..])
        .map_err(|e| ValueError::InvalidDataUrl { message: e.to_string() })
}
