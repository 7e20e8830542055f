//! Runtime type tags for predictor values.
//!
//! The discriminants are part of the native engine ABI and the lowercase names
//! are part of the remote wire format. Neither may change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ValueError, ValueResult};

/// Closed set of value type tags.
///
/// # Example
///
/// ```rust
/// use fxn_values::Dtype;
///
/// let dtype: Dtype = "float32".parse().unwrap();
/// assert_eq!(dtype, Dtype::Float32);
/// assert_eq!(dtype as i32, 2);
/// assert_eq!(dtype.element_size(), Some(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum Dtype {
    Null = 0,
    Float16 = 1,
    Float32 = 2,
    Float64 = 3,
    Int8 = 4,
    Int16 = 5,
    Int32 = 6,
    Int64 = 7,
    Uint8 = 8,
    Uint16 = 9,
    Uint32 = 10,
    Uint64 = 11,
    Bool = 12,
    String = 13,
    List = 14,
    Dict = 15,
    Image = 16,
    Binary = 17,
    Audio = 18,
    Video = 19,
}

impl Dtype {
    /// Every tag, in discriminant order.
    pub const ALL: [Dtype; 20] = [
        Dtype::Null,
        Dtype::Float16,
        Dtype::Float32,
        Dtype::Float64,
        Dtype::Int8,
        Dtype::Int16,
        Dtype::Int32,
        Dtype::Int64,
        Dtype::Uint8,
        Dtype::Uint16,
        Dtype::Uint32,
        Dtype::Uint64,
        Dtype::Bool,
        Dtype::String,
        Dtype::List,
        Dtype::Dict,
        Dtype::Image,
        Dtype::Binary,
        Dtype::Audio,
        Dtype::Video,
    ];

    /// Wire name of the tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Dtype::Null => "null",
            Dtype::Float16 => "float16",
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
            Dtype::Int8 => "int8",
            Dtype::Int16 => "int16",
            Dtype::Int32 => "int32",
            Dtype::Int64 => "int64",
            Dtype::Uint8 => "uint8",
            Dtype::Uint16 => "uint16",
            Dtype::Uint32 => "uint32",
            Dtype::Uint64 => "uint64",
            Dtype::Bool => "bool",
            Dtype::String => "string",
            Dtype::List => "list",
            Dtype::Dict => "dict",
            Dtype::Image => "image",
            Dtype::Binary => "binary",
            Dtype::Audio => "audio",
            Dtype::Video => "video",
        }
    }

    /// Map a raw engine discriminant back to a tag.
    pub fn from_raw(raw: i32) -> ValueResult<Self> {
        Dtype::ALL
            .iter()
            .copied()
            .find(|dtype| *dtype as i32 == raw)
            .ok_or_else(|| ValueError::UnknownDtype { tag: raw.to_string() })
    }

    /// Byte width of one element for numeric tags, `None` otherwise.
    pub const fn element_size(self) -> Option<usize> {
        match self {
            Dtype::Int8 | Dtype::Uint8 | Dtype::Bool => Some(1),
            Dtype::Float16 | Dtype::Int16 | Dtype::Uint16 => Some(2),
            Dtype::Float32 | Dtype::Int32 | Dtype::Uint32 => Some(4),
            Dtype::Float64 | Dtype::Int64 | Dtype::Uint64 => Some(8),
            _ => None,
        }
    }

    /// Whether values of this tag travel as a flat element buffer.
    pub const fn is_numeric(self) -> bool {
        self.element_size().is_some()
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dtype {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dtype::ALL
            .iter()
            .copied()
            .find(|dtype| dtype.as_str() == s)
            .ok_or_else(|| ValueError::UnknownDtype { tag: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminants_are_stable() {
        assert_eq!(Dtype::Null as i32, 0);
        assert_eq!(Dtype::Float16 as i32, 1);
        assert_eq!(Dtype::Bool as i32, 12);
        assert_eq!(Dtype::String as i32, 13);
        assert_eq!(Dtype::Image as i32, 16);
        assert_eq!(Dtype::Video as i32, 19);
    }

    #[test]
    fn test_names_round_trip() {
        for dtype in Dtype::ALL {
            assert_eq!(dtype.as_str().parse::<Dtype>().unwrap(), dtype);
            assert_eq!(Dtype::from_raw(dtype as i32).unwrap(), dtype);
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Dtype::Uint16).unwrap();
        assert_eq!(json, "\"uint16\"");
        let parsed: Dtype = serde_json::from_str("\"float64\"").unwrap();
        assert_eq!(parsed, Dtype::Float64);
    }

    #[test]
    fn test_unknown_tags_are_rejected() {
        assert!(matches!(
            "complex64".parse::<Dtype>(),
            Err(ValueError::UnknownDtype { tag }) if tag == "complex64"
        ));
        assert!(Dtype::from_raw(20).is_err());
        assert!(Dtype::from_raw(-1).is_err());
    }

    #[test]
    fn test_element_sizes() {
        assert_eq!(Dtype::Float16.element_size(), Some(2));
        assert_eq!(Dtype::Float64.element_size(), Some(8));
        assert_eq!(Dtype::Bool.element_size(), Some(1));
        assert_eq!(Dtype::Uint32.element_size(), Some(4));
        assert_eq!(Dtype::String.element_size(), None);
        assert!(!Dtype::Image.is_numeric());
    }
}
