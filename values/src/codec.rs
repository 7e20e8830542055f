//! Flat element-buffer codec for numeric values.
//!
//! Both transport paths serialize numbers the same way: the native-endian
//! bytes of every element in row-major order, plus a shape carried out of
//! band. An empty shape means a scalar.

use std::borrow::Cow;

use crate::dtype::Dtype;
use crate::error::{ValueError, ValueResult};
use crate::tensor::{element_count, Element, Half, Tensor};
use crate::value::Value;

/// Result of decoding an element buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Scalar(T),
    Tensor(Tensor<T>),
}

impl<T: Element> From<Decoded<T>> for Value {
    fn from(decoded: Decoded<T>) -> Self {
        match decoded {
            Decoded::Scalar(v) => Value::Scalar(v.into_scalar()),
            Decoded::Tensor(t) => Value::Tensor(T::into_tensor(t)),
        }
    }
}

/// Encode elements into their byte buffer.
pub fn encode<T: Element>(elements: &[T]) -> Cow<'_, [u8]> {
    T::to_bytes(elements)
}

/// Decode a byte buffer into elements of `T` with the given shape.
///
/// Fails with [`ValueError::MalformedBuffer`] unless the buffer holds exactly
/// `product(shape)` elements.
pub fn decode<T: Element>(bytes: &[u8], shape: &[usize]) -> ValueResult<Decoded<T>> {
    check_length(T::DTYPE, bytes.len(), shape)?;
    let elements = T::from_bytes(bytes);
    if shape.is_empty() {
        // Length check guarantees exactly one element.
        return elements
            .into_iter()
            .next()
            .map(Decoded::Scalar)
            .ok_or(ValueError::MalformedBuffer {
                dtype: T::DTYPE,
                expected: std::mem::size_of::<T>(),
                actual: bytes.len(),
            });
    }
    Tensor::new(elements, shape.to_vec()).map(Decoded::Tensor)
}

/// Decode a numeric buffer whose element type is only known at runtime.
pub fn decode_numeric(dtype: Dtype, bytes: &[u8], shape: &[usize]) -> ValueResult<Value> {
    match dtype {
        Dtype::Float16 => decode::<Half>(bytes, shape).map(Value::from),
        Dtype::Float32 => decode::<f32>(bytes, shape).map(Value::from),
        Dtype::Float64 => decode::<f64>(bytes, shape).map(Value::from),
        Dtype::Int8 => decode::<i8>(bytes, shape).map(Value::from),
        Dtype::Int16 => decode::<i16>(bytes, shape).map(Value::from),
        Dtype::Int32 => decode::<i32>(bytes, shape).map(Value::from),
        Dtype::Int64 => decode::<i64>(bytes, shape).map(Value::from),
        Dtype::Uint8 => decode::<u8>(bytes, shape).map(Value::from),
        Dtype::Uint16 => decode::<u16>(bytes, shape).map(Value::from),
        Dtype::Uint32 => decode::<u32>(bytes, shape).map(Value::from),
        Dtype::Uint64 => decode::<u64>(bytes, shape).map(Value::from),
        Dtype::Bool => decode::<bool>(bytes, shape).map(Value::from),
        other => Err(ValueError::unsupported(other, "numeric decoding")),
    }
}

/// Borrowed view of a numeric value as dtype, shape and element bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericBuffer<'a> {
    pub dtype: Dtype,
    pub shape: Vec<usize>,
    pub bytes: Cow<'a, [u8]>,
}

/// View a scalar or tensor value as its element buffer.
///
/// Returns `None` for non-numeric values. Unaliased enum members count as
/// `int32` scalars.
pub fn numeric_buffer(value: &Value) -> Option<NumericBuffer<'_>> {
    match value {
        Value::Scalar(scalar) => Some(NumericBuffer {
            dtype: scalar.dtype(),
            shape: Vec::new(),
            bytes: Cow::Owned(scalar.to_bytes()),
        }),
        Value::Tensor(tensor) => Some(NumericBuffer {
            dtype: tensor.dtype(),
            shape: tensor.shape().to_vec(),
            bytes: tensor.to_bytes(),
        }),
        Value::Enum(member) if member.alias().is_none() => Some(NumericBuffer {
            dtype: Dtype::Int32,
            shape: Vec::new(),
            bytes: Cow::Owned(member.ordinal().to_ne_bytes().to_vec()),
        }),
        _ => None,
    }
}

fn check_length(dtype: Dtype, actual: usize, shape: &[usize]) -> ValueResult<()> {
    let size = dtype.element_size().unwrap_or(1);
    let expected = element_count(shape)
        .and_then(|count| count.checked_mul(size))
        .ok_or_else(|| ValueError::ShapeMismatch {
            shape: shape.to_vec(),
            len: actual / size,
        })?;
    if expected != actual {
        return Err(ValueError::MalformedBuffer { dtype, expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{Scalar, TensorData};

    #[test]
    fn test_float32_scalar_bytes() {
        let bytes = encode(&[3.0f32]);
        assert_eq!(&bytes[..], &[0x00, 0x00, 0x40, 0x40]);
        assert_eq!(decode::<f32>(&bytes, &[]).unwrap(), Decoded::Scalar(3.0));
    }

    #[test]
    fn test_decode_tensor_with_shape() {
        let bytes = encode(&[1i16, 2, 3, 4, 5, 6]).into_owned();
        let decoded = decode::<i16>(&bytes, &[2, 3]).unwrap();
        let Decoded::Tensor(tensor) = decoded else {
            panic!("expected tensor");
        };
        assert_eq!(tensor.shape(), &[2, 3]);
        assert_eq!(tensor.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_length_mismatch_is_malformed() {
        let err = decode::<f32>(&[0; 7], &[2]).unwrap_err();
        assert_eq!(
            err,
            ValueError::MalformedBuffer { dtype: Dtype::Float32, expected: 8, actual: 7 }
        );
        assert!(decode::<u64>(&[0; 4], &[]).is_err());
    }

    #[test]
    fn test_empty_tensor() {
        let decoded = decode_numeric(Dtype::Float64, &[], &[0]).unwrap();
        assert_eq!(decoded.shape(), Some(vec![0]));
    }

    #[test]
    fn test_decode_numeric_dispatches_on_dtype() {
        let value = decode_numeric(Dtype::Uint32, &7u32.to_ne_bytes(), &[]).unwrap();
        assert_eq!(value, Value::Scalar(Scalar::Uint32(7)));

        let value = decode_numeric(Dtype::Bool, &[1, 0], &[2]).unwrap();
        assert_eq!(value, Value::Tensor(TensorData::Bool(Tensor::vector(vec![true, false]))));

        assert!(matches!(
            decode_numeric(Dtype::String, b"abc", &[]),
            Err(ValueError::UnsupportedValueKind { dtype: Dtype::String, .. })
        ));
    }

    #[test]
    fn test_enum_ordinal_matches_int32_bytes() {
        let member = crate::EnumMember::of(Level::High);
        let enum_value = Value::Enum(member);
        let int_value = Value::from(2i32);
        let from_enum = numeric_buffer(&enum_value).unwrap();
        let from_int = numeric_buffer(&int_value).unwrap();
        assert_eq!(from_enum.dtype, Dtype::Int32);
        assert_eq!(from_enum.bytes, from_int.bytes);
        assert_eq!(decode_numeric(Dtype::Int32, &from_enum.bytes, &[]).unwrap(), Value::from(2i32));
    }

    crate::aliased_enum! {
        enum Level {
            Low = 1,
            High = 2,
        }
    }

    #[test]
    fn test_numeric_buffer_views() {
        let value = Value::from(vec![1.5f64, -2.0]);
        let buffer = numeric_buffer(&value).unwrap();
        assert_eq!(buffer.dtype, Dtype::Float64);
        assert_eq!(buffer.shape, vec![2]);
        assert_eq!(buffer.bytes.len(), 16);
        assert!(numeric_buffer(&Value::from("text")).is_none());
    }
}
