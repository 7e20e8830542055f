//! # Function Values
//!
//! Typed value system shared by the local and remote prediction paths.
//!
//! This crate provides:
//! - **Dtype tags** with stable engine discriminants and wire names
//! - **A closed value sum type** covering scalars, tensors, text, JSON,
//!   images and blobs
//! - **The numeric codec** used by both transports
//! - **Wire records** and `data:` URL helpers for the remote service
//!
//! ## Architecture
//!
//! ```text
//! Value ──dtype()──> Dtype
//!   │
//!   ├─ numeric ──codec──> (Dtype, shape, native-endian bytes)
//!   └─ other   ──marshaller-specific──> engine handle | WireValue
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use fxn_values::{codec, Dtype, Value};
//!
//! let radius = Value::from(3.0f32);
//! assert_eq!(radius.dtype(), Dtype::Float32);
//! assert_eq!(radius.shape(), Some(vec![]));
//!
//! let buffer = codec::numeric_buffer(&radius).unwrap();
//! assert_eq!(&buffer.bytes[..], &3.0f32.to_ne_bytes());
//! ```

pub mod codec;
pub mod dtype;
pub mod enums;
pub mod error;
pub mod image;
pub mod prediction;
pub mod routing;
pub mod tag;
pub mod tensor;
pub mod value;
pub mod wire;

// Re-exports for convenience
pub use dtype::Dtype;
pub use enums::{AliasedEnum, EnumMember};
pub use error::{ValueError, ValueResult};
pub use image::Image;
pub use prediction::{Acceleration, Prediction, PredictionResource};
pub use routing::{Route, RoutingPolicy};
pub use tag::Tag;
pub use tensor::{Element, Half, Scalar, Tensor, TensorData};
pub use value::{Value, ValueMap};
pub use wire::WireValue;

// Downstream crates build JSON list/dict values without a direct dependency.
pub use serde_json;
