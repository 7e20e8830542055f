//! Numeric element kinds, scalars and tensors.
//!
//! All twelve numeric dtypes share one representation: a flat native-endian
//! element buffer plus a shape. [`Element`] ties each Rust element type to its
//! dtype and to its byte codec; [`Scalar`] and [`TensorData`] are the tagged
//! unions the rest of the crate passes around.

use std::borrow::Cow;
use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::dtype::Dtype;
use crate::error::{ValueError, ValueResult};

// ============================================================================
// Half precision carrier
// ============================================================================

/// IEEE 754 binary16 value carried as its raw bits.
///
/// Arithmetic is out of scope; the type exists so float16 buffers keep their
/// dtype through a round trip.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Half(u16);

impl Half {
    pub const ZERO: Half = Half(0);
    pub const ONE: Half = Half(0x3c00);

    pub const fn from_bits(bits: u16) -> Self {
        Half(bits)
    }

    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Widen to `f32`. Exact for every binary16 value.
    pub fn to_f32(self) -> f32 {
        let bits = self.0 as u32;
        let sign = (bits & 0x8000) << 16;
        let exp = (bits >> 10) & 0x1f;
        let mant = bits & 0x03ff;
        match exp {
            0 => {
                let magnitude = mant as f32 * f32::powi(2.0, -24);
                if sign != 0 { -magnitude } else { magnitude }
            }
            0x1f => f32::from_bits(sign | 0x7f80_0000 | (mant << 13)),
            _ => f32::from_bits(sign | ((exp + 112) << 23) | (mant << 13)),
        }
    }

    /// Narrow from `f32`, rounding to nearest with ties to even.
    pub fn from_f32(value: f32) -> Self {
        let x = value.to_bits();
        let sign = ((x >> 16) & 0x8000) as u16;
        let exp = ((x >> 23) & 0xff) as i32;
        let mant = x & 0x007f_ffff;

        if exp == 0xff {
            let quiet = if mant != 0 { 0x0200 } else { 0 };
            return Half(sign | 0x7c00 | quiet);
        }

        let half_exp = exp - 127 + 15;
        if half_exp >= 0x1f {
            return Half(sign | 0x7c00);
        }

        if half_exp <= 0 {
            if half_exp < -10 {
                return Half(sign);
            }
            let m = mant | 0x0080_0000;
            let shift = (14 - half_exp) as u32;
            let mut half_mant = m >> shift;
            let halfway = 1u32 << (shift - 1);
            let rem = m & ((1u32 << shift) - 1);
            if rem > halfway || (rem == halfway && half_mant & 1 == 1) {
                half_mant += 1;
            }
            return Half(sign | half_mant as u16);
        }

        let half_mant = mant >> 13;
        let rem = mant & 0x1fff;
        let mut bits = ((half_exp as u32) << 10) | half_mant;
        // A carry out of the mantissa correctly bumps the exponent.
        if rem > 0x1000 || (rem == 0x1000 && half_mant & 1 == 1) {
            bits += 1;
        }
        Half(sign | bits as u16)
    }
}

impl fmt::Debug for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Half({})", self.to_f32())
    }
}

impl From<f32> for Half {
    fn from(value: f32) -> Self {
        Half::from_f32(value)
    }
}

impl From<Half> for f32 {
    fn from(value: Half) -> Self {
        value.to_f32()
    }
}

// ============================================================================
// Tensor
// ============================================================================

/// Number of elements described by `shape`. The empty shape describes one.
///
/// Returns `None` when the product overflows `usize`.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, dim| acc.checked_mul(*dim))
}

/// Dense row-major tensor.
///
/// Invariant: `data.len()` equals the product of `shape`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    data: Vec<T>,
    shape: Vec<usize>,
}

impl<T> Tensor<T> {
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> ValueResult<Self> {
        match element_count(&shape) {
            Some(count) if count == data.len() => Ok(Tensor { data, shape }),
            _ => Err(ValueError::ShapeMismatch { shape, len: data.len() }),
        }
    }

    /// One-dimensional tensor with shape `[data.len()]`.
    pub fn vector(data: Vec<T>) -> Self {
        let shape = vec![data.len()];
        Tensor { data, shape }
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<usize>) {
        (self.data, self.shape)
    }
}

// ============================================================================
// Element kinds
// ============================================================================

/// A Rust type that maps one-to-one onto a numeric dtype.
pub trait Element: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const DTYPE: Dtype;

    /// Native-endian element bytes. Borrowed whenever the in-memory layout
    /// already matches.
    fn to_bytes(values: &[Self]) -> Cow<'_, [u8]>;

    /// Elements from a buffer whose length is a multiple of the element size.
    /// Trailing bytes that do not form a whole element are ignored.
    fn from_bytes(bytes: &[u8]) -> Vec<Self>;

    fn into_scalar(self) -> Scalar;

    fn into_tensor(tensor: Tensor<Self>) -> TensorData;

    fn from_scalar(scalar: &Scalar) -> Option<Self>;

    fn tensor_ref(data: &TensorData) -> Option<&Tensor<Self>>;
}

fn pod_to_bytes<T: Pod>(values: &[T]) -> Cow<'_, [u8]> {
    Cow::Borrowed(bytemuck::cast_slice(values))
}

fn pod_from_bytes<T: Pod>(bytes: &[u8]) -> Vec<T> {
    let size = std::mem::size_of::<T>();
    let count = bytes.len() / size;
    let mut out = vec![T::zeroed(); count];
    bytemuck::cast_slice_mut::<T, u8>(&mut out).copy_from_slice(&bytes[..count * size]);
    out
}

fn bool_to_bytes(values: &[bool]) -> Cow<'_, [u8]> {
    Cow::Owned(values.iter().map(|&v| v as u8).collect())
}

fn bool_from_bytes(bytes: &[u8]) -> Vec<bool> {
    bytes.iter().map(|&b| b != 0).collect()
}

macro_rules! element_kinds {
    ($($variant:ident => $ty:ty, $to:ident, $from:ident;)*) => {
        /// A single numeric value.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum Scalar {
            $($variant($ty),)*
        }

        /// A numeric tensor of any element kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum TensorData {
            $($variant(Tensor<$ty>),)*
        }

        impl Scalar {
            pub fn dtype(&self) -> Dtype {
                match self {
                    $(Scalar::$variant(_) => Dtype::$variant,)*
                }
            }

            pub fn to_bytes(&self) -> Vec<u8> {
                match self {
                    $(Scalar::$variant(v) => <$ty as Element>::to_bytes(std::slice::from_ref(v)).into_owned(),)*
                }
            }
        }

        impl TensorData {
            pub fn dtype(&self) -> Dtype {
                match self {
                    $(TensorData::$variant(_) => Dtype::$variant,)*
                }
            }

            pub fn shape(&self) -> &[usize] {
                match self {
                    $(TensorData::$variant(t) => t.shape(),)*
                }
            }

            pub fn len(&self) -> usize {
                match self {
                    $(TensorData::$variant(t) => t.len(),)*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            pub fn to_bytes(&self) -> Cow<'_, [u8]> {
                match self {
                    $(TensorData::$variant(t) => <$ty as Element>::to_bytes(t.data()),)*
                }
            }
        }

        $(
            impl Element for $ty {
                const DTYPE: Dtype = Dtype::$variant;

                fn to_bytes(values: &[Self]) -> Cow<'_, [u8]> {
                    $to(values)
                }

                fn from_bytes(bytes: &[u8]) -> Vec<Self> {
                    $from(bytes)
                }

                fn into_scalar(self) -> Scalar {
                    Scalar::$variant(self)
                }

                fn into_tensor(tensor: Tensor<Self>) -> TensorData {
                    TensorData::$variant(tensor)
                }

                fn from_scalar(scalar: &Scalar) -> Option<Self> {
                    match scalar {
                        Scalar::$variant(v) => Some(*v),
                        _ => None,
                    }
                }

                fn tensor_ref(data: &TensorData) -> Option<&Tensor<Self>> {
                    match data {
                        TensorData::$variant(t) => Some(t),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value)
                }
            }

            impl From<Tensor<$ty>> for TensorData {
                fn from(tensor: Tensor<$ty>) -> Self {
                    TensorData::$variant(tensor)
                }
            }
        )*
    };
}

element_kinds! {
    Float16 => Half, pod_to_bytes, pod_from_bytes;
    Float32 => f32, pod_to_bytes, pod_from_bytes;
    Float64 => f64, pod_to_bytes, pod_from_bytes;
    Int8 => i8, pod_to_bytes, pod_from_bytes;
    Int16 => i16, pod_to_bytes, pod_from_bytes;
    Int32 => i32, pod_to_bytes, pod_from_bytes;
    Int64 => i64, pod_to_bytes, pod_from_bytes;
    Uint8 => u8, pod_to_bytes, pod_from_bytes;
    Uint16 => u16, pod_to_bytes, pod_from_bytes;
    Uint32 => u32, pod_to_bytes, pod_from_bytes;
    Uint64 => u64, pod_to_bytes, pod_from_bytes;
    Bool => bool, bool_to_bytes, bool_from_bytes;
}

impl TensorData {
    /// Borrow the tensor as `Tensor<T>` if the element kind matches.
    pub fn as_tensor<T: Element>(&self) -> Option<&Tensor<T>> {
        T::tensor_ref(self)
    }
}

impl Scalar {
    /// Extract the value as `T` if the element kind matches.
    pub fn get<T: Element>(&self) -> Option<T> {
        T::from_scalar(self)
    }
}
