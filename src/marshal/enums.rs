//! Integer-backed enumerations.
//!
//! On the wire an enum is always a bare integer. Locally it is a named
//! constant, and every enum type carries an explicit table in both
//! directions. Lookups fail closed: an integer with no constant is an
//! [`InvalidEnumError`], never a silent default.

use thiserror::Error;

/// An enumeration with a fixed integer encoding.
///
/// Implemented by [`wire_enum!`](crate::wire_enum).
pub trait WireEnum: Copy + Sized + 'static {
    /// Type name used in error messages.
    const NAME: &'static str;

    /// Every constant, in declaration order.
    const ALL: &'static [Self];

    /// The integer sent on the wire.
    fn value(self) -> i64;

    /// The constant whose wire integer is `value`.
    fn try_from_value(value: i64) -> Option<Self>;

    /// The constant's name.
    fn label(self) -> &'static str;
}

/// An integer with no matching named constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{value} is not a valid {enum_name}")]
pub struct InvalidEnumError {
    pub enum_name: &'static str,
    pub value: i64,
}

/// Coerce a raw wire integer into the named constant of `E`.
pub fn coerce<E: WireEnum>(value: i64) -> Result<E, InvalidEnumError> {
    E::try_from_value(value).ok_or(InvalidEnumError {
        enum_name: E::NAME,
        value,
    })
}
