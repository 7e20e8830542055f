//! Property tests for the numeric codec and `data:` URLs.

use fxn_values::codec::{self, decode_numeric, numeric_buffer};
use fxn_values::wire::{decode_data_url, encode_data_url};
use fxn_values::{Dtype, Half, Tensor, Value, ValueError};
use proptest::prelude::*;

fn arb_numeric_dtype() -> impl Strategy<Value = Dtype> {
    prop_oneof![
        Just(Dtype::Float16),
        Just(Dtype::Float32),
        Just(Dtype::Float64),
        Just(Dtype::Int8),
        Just(Dtype::Int16),
        Just(Dtype::Int32),
        Just(Dtype::Int64),
        Just(Dtype::Uint8),
        Just(Dtype::Uint16),
        Just(Dtype::Uint32),
        Just(Dtype::Uint64),
        Just(Dtype::Bool),
    ]
}

fn arb_shape() -> impl Strategy<Value = Vec<usize>> {
    proptest::collection::vec(0usize..5, 0..4)
}

proptest! {
    #[test]
    fn numeric_buffer_round_trip(
        dtype in arb_numeric_dtype(),
        shape in arb_shape(),
        seed in any::<u8>(),
    ) {
        let count: usize = shape.iter().product();
        let size = dtype.element_size().unwrap();
        // Bool buffers only use 0 and 1 so re-encoding is byte-identical.
        let bytes: Vec<u8> = (0..count * size)
            .map(|i| if dtype == Dtype::Bool { (i as u8 ^ seed) & 1 } else { (i as u8).wrapping_mul(31) ^ seed })
            .collect();

        let value = decode_numeric(dtype, &bytes, &shape).unwrap();
        prop_assert_eq!(value.dtype(), dtype);
        prop_assert_eq!(value.shape(), Some(shape.clone()));

        let buffer = numeric_buffer(&value).unwrap();
        prop_assert_eq!(buffer.dtype, dtype);
        prop_assert_eq!(&buffer.shape, &shape);
        prop_assert_eq!(&buffer.bytes[..], &bytes[..]);
    }

    #[test]
    fn wrong_length_is_malformed(
        dtype in arb_numeric_dtype(),
        len in 1usize..4,
        extra in 1usize..8,
    ) {
        let size = dtype.element_size().unwrap();
        let bytes = vec![0u8; len * size + extra];
        let result = decode_numeric(dtype, &bytes, &[len]);
        let is_malformed = matches!(result, Err(ValueError::MalformedBuffer { .. }));
        prop_assert!(is_malformed);
    }

    #[test]
    fn float32_tensor_round_trip(data in proptest::collection::vec(any::<f32>().prop_filter("finite", |f| f.is_finite()), 0..32)) {
        let tensor = Tensor::vector(data.clone());
        let bytes = codec::encode(tensor.data()).into_owned();
        let decoded = decode_numeric(Dtype::Float32, &bytes, tensor.shape()).unwrap();
        prop_assert_eq!(decoded, Value::from(data));
    }

    #[test]
    fn half_widening_is_lossless(bits in any::<u16>()) {
        let half = Half::from_bits(bits);
        let wide = half.to_f32();
        prop_assume!(!wide.is_nan());
        prop_assert_eq!(Half::from_f32(wide).to_bits(), bits);
    }

    #[test]
    fn data_url_round_trip(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        mime in prop_oneof![Just("text/plain"), Just("application/json"), Just("application/octet-stream")],
    ) {
        let url = encode_data_url(&data, Some(mime));
        let prefix = format!("data:{};base64,", mime);
        prop_assert!(url.starts_with(&prefix));
        prop_assert_eq!(decode_data_url(&url).unwrap(), data);
    }
}

#[test]
fn hello_world_data_url() {
    assert_eq!(
        encode_data_url(b"hello world", Some("text/plain")),
        "data:text/plain;base64,aGVsbG8gd29ybGQ="
    );
}
