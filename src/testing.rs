//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ipc::{Gateway, IpcError, SharedGateway};
use crate::wire::WireValue;

/// One recorded `invoke`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: String,
    pub args: Vec<WireValue>,
}

// Mock Gateway
//
// Records every call and answers from a queue of canned replies. An empty
// queue answers `Nil`, which is what void procedures return.
pub struct MockGateway {
    calls: Arc<Mutex<Vec<Call>>>,
    replies: Arc<Mutex<VecDeque<Result<WireValue, IpcError>>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            replies: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Queue a successful reply.
    pub fn reply(&self, value: impl Into<WireValue>) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(value.into()));
        self
    }

    /// Queue a failing reply.
    pub fn fail(&self, err: IpcError) -> &Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Method names in issue order.
    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    /// The gateway handle plus a second reference for inspecting calls.
    pub fn shared() -> (SharedGateway, Arc<MockGateway>) {
        let mock = Arc::new(MockGateway::new());
        let gateway: SharedGateway = mock.clone();
        (gateway, mock)
    }
}

impl Gateway for MockGateway {
    fn invoke(&self, method: &str, args: &[WireValue]) -> Result<WireValue, IpcError> {
        self.calls.lock().unwrap().push(Call {
            method: method.to_string(),
            args: args.to_vec(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(WireValue::Nil))
    }
}

/// Build a wire mapping from `(key, value)` pairs.
pub fn wire_map(entries: Vec<(&str, WireValue)>) -> WireValue {
    WireValue::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

/// The mapping the server sends for a foil.
pub fn foil_wire(name: &str) -> WireValue {
    wire_map(vec![
        ("name", name.into()),
        ("camber", WireValue::Float(0.02)),
        ("camber_x", WireValue::Float(0.4)),
        ("thickness", WireValue::Float(0.12)),
        ("thickness_x", WireValue::Float(0.3)),
        ("n", WireValue::Int(61)),
    ])
}
