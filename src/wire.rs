//! Untyped wire values.
//!
//! `WireValue` is the only representation the transport understands. It is a
//! strict subset of MessagePack: maps are always keyed by strings and there
//! are no binary or extension payloads. Conversion from a decoded
//! [`rmpv::Value`] enforces that grammar; anything outside it is a
//! [`DecodeError`].

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::marshal::DecodeError;

/// String-keyed mapping of wire values.
pub type WireMap = BTreeMap<String, WireValue>;

/// An untyped value as carried by the call transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WireValue {
    /// Returned by remote procedures that produce nothing.
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<WireValue>),
    Map(WireMap),
}

impl WireValue {
    /// Short name of the value's kind, used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            WireValue::Nil => "nil",
            WireValue::Bool(_) => "bool",
            WireValue::Int(_) => "integer",
            WireValue::Float(_) => "float",
            WireValue::Str(_) => "string",
            WireValue::Array(_) => "array",
            WireValue::Map(_) => "map",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, WireValue::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Float(f) => Some(*f),
            WireValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&WireMap> {
        match self {
            WireValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Bool(value)
    }
}

impl From<i32> for WireValue {
    fn from(value: i32) -> Self {
        WireValue::Int(value.into())
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        WireValue::Int(value)
    }
}

impl From<u32> for WireValue {
    fn from(value: u32) -> Self {
        WireValue::Int(value.into())
    }
}

impl From<f64> for WireValue {
    fn from(value: f64) -> Self {
        WireValue::Float(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::Str(value.to_string())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        WireValue::Str(value)
    }
}

impl From<Vec<WireValue>> for WireValue {
    fn from(value: Vec<WireValue>) -> Self {
        WireValue::Array(value)
    }
}

impl From<WireMap> for WireValue {
    fn from(value: WireMap) -> Self {
        WireValue::Map(value)
    }
}

impl From<WireValue> for rmpv::Value {
    fn from(value: WireValue) -> Self {
        match value {
            WireValue::Nil => rmpv::Value::Nil,
            WireValue::Bool(b) => rmpv::Value::Boolean(b),
            WireValue::Int(i) => rmpv::Value::from(i),
            WireValue::Float(f) => rmpv::Value::F64(f),
            WireValue::Str(s) => rmpv::Value::from(s),
            WireValue::Array(items) => {
                rmpv::Value::Array(items.into_iter().map(rmpv::Value::from).collect())
            }
            WireValue::Map(map) => rmpv::Value::Map(
                map.into_iter()
                    .map(|(k, v)| (rmpv::Value::from(k), rmpv::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<rmpv::Value> for WireValue {
    type Error = DecodeError;

    fn try_from(value: rmpv::Value) -> Result<Self, Self::Error> {
        match value {
            rmpv::Value::Nil => Ok(WireValue::Nil),
            rmpv::Value::Boolean(b) => Ok(WireValue::Bool(b)),
            rmpv::Value::Integer(i) => i
                .as_i64()
                .map(WireValue::Int)
                .ok_or_else(|| DecodeError::Malformed(format!("integer {} out of range", i))),
            rmpv::Value::F32(f) => Ok(WireValue::Float(f.into())),
            rmpv::Value::F64(f) => Ok(WireValue::Float(f)),
            rmpv::Value::String(s) => s
                .into_str()
                .map(WireValue::Str)
                .ok_or_else(|| DecodeError::Malformed("string is not valid UTF-8".to_string())),
            // rpclib packs std::string as str, but older msgpack-c emits raw bytes
            rmpv::Value::Binary(bytes) => String::from_utf8(bytes)
                .map(WireValue::Str)
                .map_err(|_| DecodeError::Malformed("binary payload is not UTF-8 text".to_string())),
            rmpv::Value::Array(items) => items
                .into_iter()
                .map(WireValue::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(WireValue::Array),
            rmpv::Value::Map(entries) => {
                let mut map = WireMap::new();
                for (key, value) in entries {
                    let key = match key {
                        rmpv::Value::String(s) => s.into_str().ok_or_else(|| {
                            DecodeError::Malformed("map key is not valid UTF-8".to_string())
                        })?,
                        other => {
                            return Err(DecodeError::Malformed(format!(
                                "map key must be a string, found {}",
                                other
                            )))
                        }
                    };
                    let value = WireValue::try_from(value).map_err(|e| e.in_field(&key))?;
                    map.insert(key, value);
                }
                Ok(WireValue::Map(map))
            }
            rmpv::Value::Ext(tag, _) => Err(DecodeError::Malformed(format!(
                "unsupported extension type {}",
                tag
            ))),
        }
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireValue::Nil => serializer.serialize_unit(),
            WireValue::Bool(b) => serializer.serialize_bool(*b),
            WireValue::Int(i) => serializer.serialize_i64(*i),
            WireValue::Float(f) => serializer.serialize_f64(*f),
            WireValue::Str(s) => serializer.serialize_str(s),
            WireValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            WireValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

/// Renders as JSON, which is how untyped results are shown to users.
impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rmpv_rejects_non_string_keys() {
        let value = rmpv::Value::Map(vec![(rmpv::Value::from(1), rmpv::Value::from(2))]);
        let err = WireValue::try_from(value).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_from_rmpv_nested_map() {
        let value = rmpv::Value::Map(vec![
            (rmpv::Value::from("name"), rmpv::Value::from("NACA 2412")),
            (
                rmpv::Value::from("spec"),
                rmpv::Value::Map(vec![(rmpv::Value::from("ncrit"), rmpv::Value::F32(9.0))]),
            ),
        ]);
        let wire = WireValue::try_from(value).expect("valid wire value");

        assert_eq!(wire.get("name").and_then(WireValue::as_str), Some("NACA 2412"));
        assert_eq!(
            wire.get("spec").and_then(|s| s.get("ncrit")).and_then(WireValue::as_f64),
            Some(9.0)
        );
    }

    #[test]
    fn test_from_rmpv_rejects_ext() {
        let err = WireValue::try_from(rmpv::Value::Ext(3, vec![0, 1])).unwrap_err();
        assert!(err.to_string().contains("extension"));
    }

    #[test]
    fn test_from_rmpv_rejects_huge_unsigned() {
        let err = WireValue::try_from(rmpv::Value::from(u64::MAX)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_bad_nested_value_reports_key() {
        let value = rmpv::Value::Map(vec![(
            rmpv::Value::from("payload"),
            rmpv::Value::Ext(1, vec![]),
        )]);
        let err = WireValue::try_from(value).unwrap_err();
        assert!(err.to_string().contains("payload"), "got: {}", err);
    }

    #[test]
    fn test_display_as_json() {
        let mut map = WireMap::new();
        map.insert("span".to_string(), WireValue::Float(1.5));
        map.insert("tags".to_string(), WireValue::Array(vec!["a".into(), WireValue::Nil]));
        assert_eq!(WireValue::Map(map).to_string(), r#"{"span":1.5,"tags":["a",null]}"#);
    }

    #[test]
    fn test_as_f64_widens_integers() {
        assert_eq!(WireValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(WireValue::Str("3".into()).as_f64(), None);
    }
}
