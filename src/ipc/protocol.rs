//! MessagePack-RPC message envelopes.
//!
//! ```text
//! request:  [0, msgid, method, [params...]]
//! response: [1, msgid, error,  result]
//! ```
//!
//! `error` is nil on success. rpclib reports failures as a string, or as an
//! array whose string elements describe the failure.

use crate::wire::WireValue;

const REQUEST_TYPE: u64 = 0;
const RESPONSE_TYPE: u64 = 1;

/// An outgoing call.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub msgid: u32,
    pub method: String,
    pub params: Vec<WireValue>,
}

impl Request {
    pub fn new(msgid: u32, method: &str, params: Vec<WireValue>) -> Self {
        Self {
            msgid,
            method: method.to_string(),
            params,
        }
    }

    /// Encode into the four-element request array.
    pub fn to_value(&self) -> rmpv::Value {
        rmpv::Value::Array(vec![
            rmpv::Value::from(REQUEST_TYPE),
            rmpv::Value::from(self.msgid),
            rmpv::Value::from(self.method.as_str()),
            rmpv::Value::Array(self.params.iter().cloned().map(rmpv::Value::from).collect()),
        ])
    }
}

/// A decoded reply, payloads still in raw MessagePack form.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub msgid: u32,
    pub error: Option<rmpv::Value>,
    pub result: rmpv::Value,
}

impl Response {
    /// Parse the four-element response array.
    pub fn from_value(value: rmpv::Value) -> Result<Self, String> {
        let fields = match value {
            rmpv::Value::Array(fields) => fields,
            other => return Err(format!("expected response array, found {}", other)),
        };
        let [kind, msgid, error, result]: [rmpv::Value; 4] = fields
            .try_into()
            .map_err(|f: Vec<rmpv::Value>| format!("expected 4 response fields, found {}", f.len()))?;

        if kind.as_u64() != Some(RESPONSE_TYPE) {
            return Err(format!("expected response type {}, found {}", RESPONSE_TYPE, kind));
        }
        let msgid = msgid
            .as_u64()
            .and_then(|id| u32::try_from(id).ok())
            .ok_or_else(|| format!("invalid response msgid {}", msgid))?;

        Ok(Self {
            msgid,
            error: if error.is_nil() { None } else { Some(error) },
            result,
        })
    }
}

/// Flatten an rpclib error payload into a readable message.
pub fn error_message(error: &rmpv::Value) -> String {
    match error {
        rmpv::Value::String(s) => s.as_str().unwrap_or("<invalid utf-8>").to_string(),
        rmpv::Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item.as_str() {
                    Some(s) => s.to_string(),
                    None => item.to_string(),
                })
                .collect();
            parts.join(": ")
        }
        other => other.to_string(),
    }
}
