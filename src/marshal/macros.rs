//! Declarative generators for marshaled types.

/// Declare a plain payload object.
///
/// Each field lists its type and default; the defaults form the template
/// that decoding starts from. A field whose wire key differs from its Rust
/// name takes `as "Key"`.
///
/// ```ignore
/// wire_object! {
///     pub struct PolarSpec {
///         polar_type: PolarType = PolarType::FixedSpeedPolar,
///         re_type as "Re_type": i64 = 1,
///         ncrit: f64 = 9.0,
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_object {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident $(as $key:literal)? : $ty:ty = $default:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )*
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: $default, )*
                }
            }
        }

        impl $crate::marshal::Shape for $name {
            fn template(
                _gateway: ::std::option::Option<&$crate::ipc::SharedGateway>,
            ) -> Self {
                <Self as ::std::default::Default>::default()
            }

            fn assign(
                &mut self,
                key: &str,
                value: &$crate::wire::WireValue,
            ) -> ::std::result::Result<bool, $crate::marshal::DecodeError> {
                $(
                    if key == $crate::__wire_key!($field $(, $key)?) {
                        self.$field = $crate::marshal::FromWire::from_wire(value)?;
                        return ::std::result::Result::Ok(true);
                    }
                )*
                ::std::result::Result::Ok(false)
            }

            fn fields(&self) -> $crate::wire::WireMap {
                #[allow(unused_mut)]
                let mut map = $crate::wire::WireMap::new();
                $(
                    map.insert(
                        ::std::string::String::from($crate::__wire_key!($field $(, $key)?)),
                        $crate::marshal::ToWire::to_wire(&self.$field),
                    );
                )*
                map
            }
        }

        impl $crate::marshal::ToWire for $name {
            fn to_wire(&self) -> $crate::wire::WireValue {
                $crate::marshal::serialize(self)
            }
        }

        impl $crate::marshal::FromWire for $name {
            fn from_wire(
                value: &$crate::wire::WireValue,
            ) -> ::std::result::Result<Self, $crate::marshal::DecodeError> {
                $crate::marshal::deserialize(value)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wire_key {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $key:literal) => {
        $key
    };
}

/// Declare an integer-backed enumeration with its wire table.
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::marshal::WireEnum for $name {
            const NAME: &'static str = stringify!($name);
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn value(self) -> i64 {
                match self {
                    $( $name::$variant => $value, )+
                }
            }

            fn try_from_value(value: i64) -> ::std::option::Option<Self> {
                match value {
                    $( $value => ::std::option::Option::Some($name::$variant), )+
                    _ => ::std::option::Option::None,
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::marshal::WireEnum::label(*self))
            }
        }

        impl ::std::convert::From<$name> for i64 {
            fn from(value: $name) -> i64 {
                $crate::marshal::WireEnum::value(value)
            }
        }

        impl ::std::convert::TryFrom<i64> for $name {
            type Error = $crate::marshal::InvalidEnumError;

            fn try_from(value: i64) -> ::std::result::Result<Self, Self::Error> {
                $crate::marshal::coerce(value)
            }
        }

        impl $crate::marshal::ToWire for $name {
            fn to_wire(&self) -> $crate::wire::WireValue {
                $crate::wire::WireValue::Int($crate::marshal::WireEnum::value(*self))
            }
        }

        impl $crate::marshal::FromWire for $name {
            fn from_wire(
                value: &$crate::wire::WireValue,
            ) -> ::std::result::Result<Self, $crate::marshal::DecodeError> {
                let raw = <i64 as $crate::marshal::FromWire>::from_wire(value)?;
                ::std::result::Result::Ok($crate::marshal::coerce(raw)?)
            }
        }
    };
}
