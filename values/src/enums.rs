//! Enumeration members as predictor values.
//!
//! An enum member travels as its serialization alias (a string) when it has
//! one, otherwise as its ordinal (an `int32` scalar).

use crate::dtype::Dtype;
use crate::tensor::Scalar;
use crate::Value;

/// Enum types that can be passed as predictor values.
///
/// Implemented by [`aliased_enum!`](crate::aliased_enum).
pub trait AliasedEnum: Copy + 'static {
    /// Serialization alias attached to this member, if any.
    fn serialization_alias(self) -> Option<&'static str>;

    /// Integer ordinal of this member.
    fn ordinal(self) -> i32;
}

/// An enum member captured as alias and ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumMember {
    alias: Option<&'static str>,
    ordinal: i32,
}

impl EnumMember {
    pub fn of<E: AliasedEnum>(member: E) -> Self {
        EnumMember {
            alias: member.serialization_alias(),
            ordinal: member.ordinal(),
        }
    }

    pub fn alias(&self) -> Option<&'static str> {
        self.alias
    }

    pub fn ordinal(&self) -> i32 {
        self.ordinal
    }

    /// `string` when the member carries an alias, `int32` otherwise.
    pub fn dtype(&self) -> Dtype {
        if self.alias.is_some() {
            Dtype::String
        } else {
            Dtype::Int32
        }
    }

    /// The concrete value the member reduces to.
    pub fn resolve(&self) -> Value {
        match self.alias {
            Some(alias) => Value::String(alias.to_string()),
            None => Value::Scalar(Scalar::Int32(self.ordinal)),
        }
    }
}

/// Declare an enum whose members can be passed as predictor values.
///
/// Members may carry an explicit discriminant and a serialization alias.
///
/// ```rust
/// use fxn_values::{aliased_enum, Dtype, Value};
///
/// aliased_enum! {
///     pub enum Sampler {
///         Greedy => "greedy",
///         TopK = 4,
///     }
/// }
///
/// assert_eq!(Value::from(Sampler::Greedy).dtype(), Dtype::String);
/// assert_eq!(Value::from(Sampler::TopK).dtype(), Dtype::Int32);
/// ```
#[macro_export]
macro_rules! aliased_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident $(= $disc:expr)? $(=> $alias:literal)?),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant $(= $disc)?,)*
        }

        impl $crate::AliasedEnum for $name {
            fn serialization_alias(self) -> ::std::option::Option<&'static str> {
                match self {
                    $($name::$variant => $crate::__enum_alias!($($alias)?),)*
                }
            }

            fn ordinal(self) -> i32 {
                self as i32
            }
        }

        impl ::std::convert::From<$name> for $crate::Value {
            fn from(member: $name) -> Self {
                $crate::Value::Enum($crate::EnumMember::of(member))
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __enum_alias {
    () => {
        ::std::option::Option::None
    };
    ($alias:literal) => {
        ::std::option::Option::Some($alias)
    };
}
