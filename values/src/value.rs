//! The predictor value sum type.

use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use crate::dtype::Dtype;
use crate::enums::EnumMember;
use crate::image::Image;
use crate::tensor::{Element, Half, Scalar, Tensor, TensorData};

/// Ordered name to value mapping used for prediction inputs and outputs.
pub type ValueMap = IndexMap<String, Value>;

/// Any value a predictor can accept or return.
///
/// Every variant maps to exactly one [`Dtype`] through [`Value::dtype`].
/// Enum members stay as [`Value::Enum`] until a marshaller reduces them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Scalar(Scalar),
    Tensor(TensorData),
    String(String),
    List(Vec<JsonValue>),
    Dict(Map<String, JsonValue>),
    Image(Image),
    Binary(Bytes),
    Audio(Bytes),
    Video(Bytes),
    Enum(EnumMember),
}

impl Value {
    /// Classify the value into its dtype tag.
    pub fn dtype(&self) -> Dtype {
        match self {
            Value::Null => Dtype::Null,
            Value::Scalar(scalar) => scalar.dtype(),
            Value::Tensor(tensor) => tensor.dtype(),
            Value::String(_) => Dtype::String,
            Value::List(_) => Dtype::List,
            Value::Dict(_) => Dtype::Dict,
            Value::Image(_) => Dtype::Image,
            Value::Binary(_) => Dtype::Binary,
            Value::Audio(_) => Dtype::Audio,
            Value::Video(_) => Dtype::Video,
            Value::Enum(member) => member.dtype(),
        }
    }

    /// Shape of numeric values: `[]` for scalars, the tensor shape otherwise.
    pub fn shape(&self) -> Option<Vec<usize>> {
        match self {
            Value::Scalar(_) => Some(Vec::new()),
            Value::Tensor(tensor) => Some(tensor.shape().to_vec()),
            Value::Enum(member) if member.alias().is_none() => Some(Vec::new()),
            _ => None,
        }
    }

    /// Reduce enum members to their string or ordinal form.
    pub fn resolved(self) -> Value {
        match self {
            Value::Enum(member) => member.resolve(),
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar as `T` if the element kind matches.
    pub fn as_scalar<T: Element>(&self) -> Option<T> {
        match self {
            Value::Scalar(s) => s.get::<T>(),
            _ => None,
        }
    }

    /// Tensor as `Tensor<T>` if the element kind matches.
    pub fn as_tensor<T: Element>(&self) -> Option<&Tensor<T>> {
        match self {
            Value::Tensor(t) => t.as_tensor::<T>(),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Value::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Raw bytes of binary, audio and video values.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Binary(b) | Value::Audio(b) | Value::Video(b) => Some(b),
            _ => None,
        }
    }

    /// Build a value from arbitrary JSON.
    ///
    /// Integers become `int32` when they fit and `int64` (or `uint64`) when
    /// they don't; other numbers become `float32`.
    pub fn from_json(json: JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => Value::Scalar(Scalar::Int32(small)),
                        Err(_) => Value::Scalar(Scalar::Int64(i)),
                    }
                } else if let Some(u) = n.as_u64() {
                    Value::Scalar(Scalar::Uint64(u))
                } else {
                    Value::Scalar(Scalar::Float32(n.as_f64().unwrap_or_default() as f32))
                }
            }
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items),
            JsonValue::Object(map) => Value::Dict(map),
        }
    }

    /// Best-effort JSON rendering for display. Binary payloads render as their
    /// byte length.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Scalar(scalar) => scalar_json(scalar),
            Value::Tensor(tensor) => serde_json::json!({
                "type": tensor.dtype(),
                "shape": tensor.shape(),
            }),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::List(items) => JsonValue::Array(items.clone()),
            Value::Dict(map) => JsonValue::Object(map.clone()),
            Value::Image(image) => serde_json::json!({
                "type": Dtype::Image,
                "shape": image.shape(),
            }),
            Value::Binary(b) | Value::Audio(b) | Value::Video(b) => serde_json::json!({
                "type": self.dtype(),
                "length": b.len(),
            }),
            Value::Enum(member) => member.resolve().to_json(),
        }
    }
}

fn scalar_json(scalar: &Scalar) -> JsonValue {
    match *scalar {
        Scalar::Float16(v) => JsonValue::from(v.to_f32()),
        Scalar::Float32(v) => JsonValue::from(v),
        Scalar::Float64(v) => JsonValue::from(v),
        Scalar::Int8(v) => JsonValue::from(v),
        Scalar::Int16(v) => JsonValue::from(v),
        Scalar::Int32(v) => JsonValue::from(v),
        Scalar::Int64(v) => JsonValue::from(v),
        Scalar::Uint8(v) => JsonValue::from(v),
        Scalar::Uint16(v) => JsonValue::from(v),
        Scalar::Uint32(v) => JsonValue::from(v),
        Scalar::Uint64(v) => JsonValue::from(v),
        Scalar::Bool(v) => JsonValue::from(v),
    }
}

macro_rules! numeric_conversions {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Scalar(Scalar::from(value))
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(values: Vec<$ty>) -> Self {
                    Value::Tensor(TensorData::from(Tensor::vector(values)))
                }
            }

            impl From<Tensor<$ty>> for Value {
                fn from(tensor: Tensor<$ty>) -> Self {
                    Value::Tensor(TensorData::from(tensor))
                }
            }
        )*
    };
}

numeric_conversions!(Half, f32, f64, i8, i16, i32, i64, u8, u16, u32, u64, bool);

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl From<TensorData> for Value {
    fn from(tensor: TensorData) -> Self {
        Value::Tensor(tensor)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<JsonValue>> for Value {
    fn from(items: Vec<JsonValue>) -> Self {
        Value::List(items)
    }
}

impl From<Map<String, JsonValue>> for Value {
    fn from(map: Map<String, JsonValue>) -> Self {
        Value::Dict(map)
    }
}

impl From<Image> for Value {
    fn from(image: Image) -> Self {
        Value::Image(image)
    }
}

impl From<Bytes> for Value {
    fn from(bytes: Bytes) -> Self {
        Value::Binary(bytes)
    }
}

impl From<EnumMember> for Value {
    fn from(member: EnumMember) -> Self {
        Value::Enum(member)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_scalars_and_tensors() {
        assert_eq!(Value::from(3.0f32).dtype(), Dtype::Float32);
        assert_eq!(Value::from(3.0f32).shape(), Some(vec![]));
        assert_eq!(Value::from(vec![1i64, 2, 3]).dtype(), Dtype::Int64);
        assert_eq!(Value::from(vec![1i64, 2, 3]).shape(), Some(vec![3]));
        assert_eq!(Value::from(true).dtype(), Dtype::Bool);
        assert_eq!(Value::from(Half::ONE).dtype(), Dtype::Float16);
        assert_eq!(Value::from(3.0f32).as_scalar::<f32>(), Some(3.0));
        assert_eq!(Value::from(3.0f32).as_scalar::<f64>(), None);
        assert_eq!(
            Value::from(vec![1i64, 2]).as_tensor::<i64>().map(|t| t.data().to_vec()),
            Some(vec![1, 2])
        );
    }

    #[test]
    fn test_byte_vectors_are_uint8_tensors() {
        let value = Value::from(vec![1u8, 2, 3]);
        assert_eq!(value.dtype(), Dtype::Uint8);
        assert_eq!(Value::from(Bytes::from_static(b"abc")).dtype(), Dtype::Binary);
    }

    #[test]
    fn test_classify_non_numeric() {
        assert_eq!(Value::Null.dtype(), Dtype::Null);
        assert_eq!(Value::from("hi").dtype(), Dtype::String);
        assert_eq!(Value::from(vec![json!(1), json!("a")]).dtype(), Dtype::List);
        assert_eq!(Value::Dict(Map::new()).dtype(), Dtype::Dict);
        assert_eq!(Value::Audio(Bytes::new()).dtype(), Dtype::Audio);
        assert_eq!(Value::Video(Bytes::new()).dtype(), Dtype::Video);
        assert_eq!(Value::from(None::<f32>), Value::Null);
        assert_eq!(Value::from("hi").shape(), None);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from_json(json!(3)), Value::from(3i32));
        assert_eq!(Value::from_json(json!(5_000_000_000i64)), Value::from(5_000_000_000i64));
        assert_eq!(Value::from_json(json!(1.5)), Value::from(1.5f32));
        assert_eq!(Value::from_json(json!([1, 2])).dtype(), Dtype::List);
        assert_eq!(Value::from_json(json!({"a": 1})).dtype(), Dtype::Dict);
        assert!(Value::from_json(JsonValue::Null).is_null());
    }
}
