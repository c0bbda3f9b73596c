//! In-process MessagePack-RPC server standing in for xflr5.
//!
//! Speaks the rpclib envelope on a loopback TCP socket and answers each
//! request through a handler closure, recording every call it sees.

#![allow(dead_code)]

use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rmpv::Value;
use xflr_client::ClientConfig;

/// What the server does with one request.
pub enum Reply {
    /// Answer with a result.
    Result(Value),
    /// Answer with an error payload.
    Error(Value),
    /// Close the connection without answering.
    Hangup,
    /// Answer with a result under the wrong msgid.
    WrongId(Value),
}

impl Reply {
    pub fn nil() -> Self {
        Reply::Result(Value::Nil)
    }
}

/// A request as the server decoded it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub msgid: u64,
    pub method: String,
    pub params: Vec<Value>,
}

pub struct MockServer {
    addr: SocketAddr,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockServer {
    /// Bind an ephemeral port and serve connections one after another.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let calls = Arc::new(Mutex::new(Vec::new()));

        let recorded = calls.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve(stream, &handler, &recorded);
            }
        });

        Self { addr, calls }
    }

    /// Client configuration pointing at this server.
    pub fn config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_host(self.addr.ip().to_string())
            .with_port(self.addr.port())
            .with_connect_timeout(Duration::from_secs(2))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }
}

fn serve<F>(stream: TcpStream, handler: &F, calls: &Mutex<Vec<RecordedCall>>)
where
    F: Fn(&str, &[Value]) -> Reply,
{
    let mut writer = stream.try_clone().expect("clone stream");
    let mut reader = BufReader::new(stream);

    while let Ok(request) = rmpv::decode::read_value(&mut reader) {
        let Some(call) = parse_request(&request) else {
            break;
        };
        calls.lock().unwrap().push(call.clone());

        let (msgid, error, result) = match handler(&call.method, &call.params) {
            Reply::Result(value) => (call.msgid, Value::Nil, value),
            Reply::Error(err) => (call.msgid, err, Value::Nil),
            Reply::WrongId(value) => (call.msgid + 1, Value::Nil, value),
            Reply::Hangup => {
                let _ = writer.shutdown(std::net::Shutdown::Both);
                break;
            }
        };

        let response = Value::Array(vec![Value::from(1), Value::from(msgid), error, result]);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &response).expect("encode response");
        if writer.write_all(&buf).is_err() {
            break;
        }
    }
}

fn parse_request(value: &Value) -> Option<RecordedCall> {
    let items = value.as_array()?;
    if items.len() != 4 || items[0].as_u64() != Some(0) {
        return None;
    }
    Some(RecordedCall {
        msgid: items[1].as_u64()?,
        method: items[2].as_str()?.to_string(),
        params: items[3].as_array()?.clone(),
    })
}

/// Build a msgpack map from string keys.
pub fn map(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::from(k), v))
            .collect(),
    )
}
