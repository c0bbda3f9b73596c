//! Typed marshaling between local objects and [`WireValue`]s.
//!
//! The wire format carries no type tags, so decoding is always driven by the
//! receiving side: the caller names the target type and that type's
//! [`Shape`] decides, field by field, how each incoming value is read.
//!
//! ```text
//! WireValue::Map ──deserialize::<Polar>──► Polar::template()
//!                                           ├─ "name"   → String::from_wire
//!                                           ├─ "spec"   → PolarSpec (recurse)
//!                                           ├─ "result" → PolarResult (recurse)
//!                                           └─ unknown  → ignored
//! ```
//!
//! Object types are declared with [`wire_object!`](crate::wire_object) and
//! enumerations with [`wire_enum!`](crate::wire_enum); both generate the
//! `ToWire`/`FromWire` capability impls used here.

mod enums;
mod macros;

use thiserror::Error;
use tracing::trace;

use crate::ipc::SharedGateway;
use crate::wire::{WireMap, WireValue};

pub use enums::{coerce, InvalidEnumError, WireEnum};

/// Failure to read a typed value out of a wire value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The wire value has a different kind than the target type expects.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Decoding a named field failed.
    #[error("field `{field}`: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<DecodeError>,
    },

    /// An enum field carried an integer with no named constant.
    #[error(transparent)]
    InvalidEnum(#[from] InvalidEnumError),

    /// The value is outside the wire grammar altogether.
    #[error("malformed wire value: {0}")]
    Malformed(String),
}

impl DecodeError {
    pub(crate) fn mismatch(expected: &'static str, found: &WireValue) -> Self {
        DecodeError::TypeMismatch {
            expected,
            found: found.kind(),
        }
    }

    /// Wrap this error with the field (or index) it occurred in.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        DecodeError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all field context stripped.
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            DecodeError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Dotted path to the failing field, e.g. `wing.sections.0.chord`.
    pub fn path(&self) -> String {
        let mut parts = Vec::new();
        let mut current = self;
        while let DecodeError::Field { field, source } = current {
            parts.push(field.as_str());
            current = source;
        }
        parts.join(".")
    }
}

/// Conversion of a local value into its wire form.
pub trait ToWire {
    fn to_wire(&self) -> WireValue;
}

/// Reconstruction of a local value from its wire form.
pub trait FromWire: Sized {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError>;
}

/// A local object type whose field table drives decoding.
///
/// Implemented by [`wire_object!`](crate::wire_object) for plain payloads and
/// by hand for live objects that keep a gateway reference.
pub trait Shape: Sized {
    /// A fresh instance with every field at its default. Types that offer
    /// live operations keep the gateway; others ignore it.
    fn template(gateway: Option<&SharedGateway>) -> Self;

    /// Decode `value` into the field whose wire key is `key`.
    ///
    /// Returns `Ok(false)` when the shape has no such field.
    fn assign(&mut self, key: &str, value: &WireValue) -> Result<bool, DecodeError>;

    /// Every field keyed by its wire name.
    fn fields(&self) -> WireMap;
}

/// Emit every field of `obj` as a wire mapping.
pub fn serialize<T: Shape>(obj: &T) -> WireValue {
    WireValue::Map(obj.fields())
}

/// Rebuild a detached `T` from a wire mapping.
pub fn deserialize<T: Shape>(value: &WireValue) -> Result<T, DecodeError> {
    deserialize_with(value, None)
}

/// Rebuild a `T` from a wire mapping, handing `gateway` to its template.
///
/// Keys that `T` does not declare are skipped. Fields missing from the
/// mapping keep their template defaults.
pub fn deserialize_with<T: Shape>(
    value: &WireValue,
    gateway: Option<&SharedGateway>,
) -> Result<T, DecodeError> {
    let map = value
        .as_map()
        .ok_or_else(|| DecodeError::mismatch("map", value))?;

    let mut obj = T::template(gateway);
    for (key, field) in map {
        let known = obj.assign(key, field).map_err(|e| e.in_field(key.as_str()))?;
        if !known {
            trace!(
                key = %key,
                shape = std::any::type_name::<T>(),
                "ignoring unknown wire key"
            );
        }
    }
    Ok(obj)
}

// ---------------------------------------------------------------------------
// Primitive impls
// ---------------------------------------------------------------------------

impl ToWire for WireValue {
    fn to_wire(&self) -> WireValue {
        self.clone()
    }
}

impl FromWire for WireValue {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        Ok(value.clone())
    }
}

impl<T: ToWire + ?Sized> ToWire for &T {
    fn to_wire(&self) -> WireValue {
        (**self).to_wire()
    }
}

impl ToWire for bool {
    fn to_wire(&self) -> WireValue {
        WireValue::Bool(*self)
    }
}

impl FromWire for bool {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        value
            .as_bool()
            .ok_or_else(|| DecodeError::mismatch("bool", value))
    }
}

impl ToWire for i64 {
    fn to_wire(&self) -> WireValue {
        WireValue::Int(*self)
    }
}

impl FromWire for i64 {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        value
            .as_i64()
            .ok_or_else(|| DecodeError::mismatch("integer", value))
    }
}

impl ToWire for i32 {
    fn to_wire(&self) -> WireValue {
        WireValue::Int((*self).into())
    }
}

impl FromWire for i32 {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        let raw = i64::from_wire(value)?;
        i32::try_from(raw)
            .map_err(|_| DecodeError::Malformed(format!("integer {} does not fit in i32", raw)))
    }
}

impl ToWire for u32 {
    fn to_wire(&self) -> WireValue {
        WireValue::Int((*self).into())
    }
}

impl FromWire for u32 {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        let raw = i64::from_wire(value)?;
        u32::try_from(raw)
            .map_err(|_| DecodeError::Malformed(format!("integer {} does not fit in u32", raw)))
    }
}

impl ToWire for f64 {
    fn to_wire(&self) -> WireValue {
        WireValue::Float(*self)
    }
}

/// Integers are accepted: both ends freely write `10` for `10.0`.
impl FromWire for f64 {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        value
            .as_f64()
            .ok_or_else(|| DecodeError::mismatch("number", value))
    }
}

impl ToWire for str {
    fn to_wire(&self) -> WireValue {
        WireValue::Str(self.to_string())
    }
}

impl ToWire for String {
    fn to_wire(&self) -> WireValue {
        WireValue::Str(self.clone())
    }
}

impl FromWire for String {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DecodeError::mismatch("string", value))
    }
}

/// Results of procedures that return nothing are discarded unread.
impl FromWire for () {
    fn from_wire(_value: &WireValue) -> Result<Self, DecodeError> {
        Ok(())
    }
}

impl<T: ToWire> ToWire for [T] {
    fn to_wire(&self) -> WireValue {
        WireValue::Array(self.iter().map(ToWire::to_wire).collect())
    }
}

impl<T: ToWire> ToWire for Vec<T> {
    fn to_wire(&self) -> WireValue {
        self.as_slice().to_wire()
    }
}

impl<T: FromWire> FromWire for Vec<T> {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        let items = value
            .as_array()
            .ok_or_else(|| DecodeError::mismatch("array", value))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| T::from_wire(item).map_err(|e| e.in_field(i.to_string())))
            .collect()
    }
}

impl<T: ToWire> ToWire for Option<T> {
    fn to_wire(&self) -> WireValue {
        match self {
            Some(value) => value.to_wire(),
            None => WireValue::Nil,
        }
    }
}

impl<T: FromWire> FromWire for Option<T> {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        match value {
            WireValue::Nil => Ok(None),
            other => T::from_wire(other).map(Some),
        }
    }
}

macro_rules! tuple_wire {
    ($len:literal; $($name:ident $idx:tt),+) => {
        impl<$($name: ToWire),+> ToWire for ($($name,)+) {
            fn to_wire(&self) -> WireValue {
                WireValue::Array(vec![$(self.$idx.to_wire()),+])
            }
        }

        impl<$($name: FromWire),+> FromWire for ($($name,)+) {
            fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
                let items = value
                    .as_array()
                    .ok_or_else(|| DecodeError::mismatch("array", value))?;
                if items.len() != $len {
                    return Err(DecodeError::Malformed(format!(
                        "expected {} elements, found {}",
                        $len,
                        items.len()
                    )));
                }
                Ok(($(
                    $name::from_wire(&items[$idx]).map_err(|e| e.in_field(stringify!($idx)))?,
                )+))
            }
        }
    };
}

tuple_wire!(2; A 0, B 1);
tuple_wire!(3; A 0, B 1, C 2);
