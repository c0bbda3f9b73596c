//! Blocking MessagePack-RPC client for the xflr5 server.
//!
//! This module provides `RpcClient`, which owns one TCP connection to the
//! xflr5 RPC server and performs strictly sequential request/response calls.
//! The socket is driven by a private single-threaded tokio runtime; every
//! call blocks the calling thread until the reply (or a failure) arrives.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::ipc::framing::{read_message, write_message};
use crate::ipc::protocol::{error_message, Request, Response};
use crate::ipc::Gateway;
use crate::marshal::DecodeError;
use crate::wire::WireValue;

/// IPC-specific error types.
///
/// Connection failures, protocol violations and errors reported by the
/// remote application are kept apart so callers can react differently.
#[derive(Debug, Error)]
pub enum IpcError {
    /// Failed to connect to the server.
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] std::io::Error),

    /// The server did not accept the connection within the connect timeout.
    #[error("Connection to {endpoint} timed out after {timeout:?}")]
    ConnectTimeout {
        /// `host:port` that was dialed
        endpoint: String,
        /// Configured bound
        timeout: Duration,
    },

    /// An earlier call failed mid-flight and the connection was dropped.
    #[error("Connection closed after an earlier failure")]
    Disconnected,

    /// Protocol-level error (framing, envelope, msgid mismatch).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The response payload is outside the wire grammar.
    #[error("Malformed response: {0}")]
    Malformed(#[from] DecodeError),

    /// The remote application reported a failure for this call.
    #[error("Remote error in `{method}`: {message}")]
    Remote {
        /// Method that failed
        method: String,
        /// Flattened error message
        message: String,
        /// Raw error payload
        data: WireValue,
    },

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl From<std::io::Error> for IpcError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused => {
                IpcError::ConnectionFailed(err)
            }
            _ => IpcError::Io(err),
        }
    }
}

impl IpcError {
    /// Classify a framing failure: stream errors are I/O, the rest protocol.
    fn from_framing(action: &str, err: anyhow::Error) -> Self {
        match err.downcast_ref::<std::io::Error>() {
            Some(io) => IpcError::Io(std::io::Error::new(
                io.kind(),
                format!("{}: {:#}", action, err),
            )),
            None => IpcError::Protocol(format!("{}: {:#}", action, err)),
        }
    }
}

/// The socket halves plus decoder carry-over for one connection.
struct Connection {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    /// Bytes read past the end of the previous message.
    pending: Vec<u8>,
    /// Set once a call fails mid-flight; the stream position is then unknown.
    broken: bool,
}

impl Connection {
    /// Send a request and receive the response (internal, no timeout).
    async fn send_receive(&mut self, request: &Request) -> Result<Response, IpcError> {
        write_message(&mut self.writer, &request.to_value())
            .await
            .map_err(|e| IpcError::from_framing("Failed to send request", e))?;

        let value = read_message(&mut self.reader, &mut self.pending)
            .await
            .map_err(|e| IpcError::from_framing("Failed to read response", e))?;

        Response::from_value(value).map_err(IpcError::Protocol)
    }
}

/// Blocking client for the xflr5 MessagePack-RPC server.
///
/// One instance owns exactly one connection. Calls are issued strictly in
/// order; the connection is guarded so that a second caller waits for the
/// first call to finish instead of interleaving on the stream.
///
/// `RpcClient` drives its own tokio runtime, so it must not be used (or
/// dropped) from inside another async runtime.
///
/// # Example
///
/// ```ignore
/// use xflr_client::{ClientConfig, Gateway, RpcClient};
///
/// let client = RpcClient::connect(&ClientConfig::default())?;
/// let alive = client.invoke("ping", &[])?;
/// ```
pub struct RpcClient {
    connection: Mutex<Connection>,
    /// Monotonically increasing msgid counter.
    request_id: AtomicU32,
    endpoint: String,
    runtime: Runtime,
}

impl RpcClient {
    /// Connect to the server described by `config`.
    ///
    /// # Errors
    ///
    /// - `IpcError::ConnectTimeout` if the server does not accept within
    ///   the configured connect timeout
    /// - `IpcError::ConnectionFailed` if the connection is refused or the
    ///   host cannot be resolved
    pub fn connect(config: &ClientConfig) -> Result<Self, IpcError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(IpcError::Io)?;

        let endpoint = config.endpoint();
        let connect_timeout = config.connect_timeout();

        let stream = runtime.block_on(bounded_connect(
            TcpStream::connect(endpoint.as_str()),
            &endpoint,
            connect_timeout,
        ))?;

        stream.set_nodelay(true).map_err(IpcError::Io)?;
        let (reader, writer) = stream.into_split();

        info!(endpoint = %endpoint, "Connected to xflr5 server");

        Ok(Self {
            connection: Mutex::new(Connection {
                reader,
                writer,
                pending: Vec::new(),
                broken: false,
            }),
            request_id: AtomicU32::new(0),
            endpoint,
            runtime,
        })
    }

    /// The `host:port` this client is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Generate the next request ID.
    fn next_id(&self) -> u32 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Gateway for RpcClient {
    fn invoke(&self, method: &str, args: &[WireValue]) -> Result<WireValue, IpcError> {
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| IpcError::Disconnected)?;
        if connection.broken {
            return Err(IpcError::Disconnected);
        }

        let request = Request::new(self.next_id(), method, args.to_vec());
        debug!(method, msgid = request.msgid, args = args.len(), "Invoking remote method");

        let response = match self.runtime.block_on(connection.send_receive(&request)) {
            Ok(response) => response,
            Err(e) => {
                warn!(method, error = %e, "Call failed; dropping connection");
                connection.broken = true;
                return Err(e);
            }
        };

        if response.msgid != request.msgid {
            connection.broken = true;
            return Err(IpcError::Protocol(format!(
                "Response msgid {} does not match request msgid {}",
                response.msgid, request.msgid
            )));
        }

        if let Some(error) = response.error {
            let message = error_message(&error);
            debug!(method, message = %message, "Remote reported an error");
            return Err(IpcError::Remote {
                method: method.to_string(),
                message,
                data: WireValue::try_from(error).unwrap_or_default(),
            });
        }

        Ok(WireValue::try_from(response.result)?)
    }
}

/// Await `connect` for at most `limit`, mapping the outcome to `IpcError`.
async fn bounded_connect<T, F>(connect: F, endpoint: &str, limit: Duration) -> Result<T, IpcError>
where
    F: Future<Output = std::io::Result<T>>,
{
    timeout(limit, connect)
        .await
        .map_err(|_| IpcError::ConnectTimeout {
            endpoint: endpoint.to_string(),
            timeout: limit,
        })?
        .map_err(IpcError::ConnectionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipc_error_display() {
        let timeout_err = IpcError::ConnectTimeout {
            endpoint: "localhost:8080".to_string(),
            timeout: Duration::from_millis(100),
        };
        assert_eq!(
            timeout_err.to_string(),
            "Connection to localhost:8080 timed out after 100ms"
        );

        let remote_err = IpcError::Remote {
            method: "getFoil".to_string(),
            message: "foil not found".to_string(),
            data: WireValue::Nil,
        };
        assert_eq!(
            remote_err.to_string(),
            "Remote error in `getFoil`: foil not found"
        );

        let protocol_err = IpcError::Protocol("Invalid envelope".to_string());
        assert_eq!(protocol_err.to_string(), "Protocol error: Invalid envelope");
    }

    #[tokio::test]
    async fn test_connect_that_never_completes_times_out() {
        let limit = Duration::from_millis(50);
        let start = std::time::Instant::now();

        let err = bounded_connect(
            std::future::pending::<std::io::Result<()>>(),
            "10.255.255.1:8080",
            limit,
        )
        .await
        .unwrap_err();

        match err {
            IpcError::ConnectTimeout { endpoint, timeout } => {
                assert_eq!(endpoint, "10.255.255.1:8080");
                assert_eq!(timeout, limit);
            }
            other => panic!("Expected ConnectTimeout, got {:?}", other),
        }
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_refused_connect_is_connection_failed() {
        let refused = async {
            Err::<(), _>(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            ))
        };

        let err = bounded_connect(refused, "127.0.0.1:1", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, IpcError::ConnectionFailed(_)), "got: {:?}", err);
    }

    #[test]
    fn test_ipc_error_from_io() {
        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let ipc_err: IpcError = not_found.into();
        assert!(matches!(ipc_err, IpcError::ConnectionFailed(_)));

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let ipc_err: IpcError = refused.into();
        assert!(matches!(ipc_err, IpcError::ConnectionFailed(_)));

        let other = std::io::Error::new(std::io::ErrorKind::Other, "other");
        let ipc_err: IpcError = other.into();
        assert!(matches!(ipc_err, IpcError::Io(_)));
    }

    #[test]
    fn test_framing_errors_are_classified() {
        let eof = anyhow::Error::new(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "Connection closed by server",
        ))
        .context("while reading");
        let err = IpcError::from_framing("Failed to read response", eof);
        match err {
            IpcError::Io(io) => {
                assert_eq!(io.kind(), std::io::ErrorKind::UnexpectedEof);
                assert!(io.to_string().contains("Connection closed"));
            }
            other => panic!("Expected Io, got {:?}", other),
        }

        let garbage = anyhow::anyhow!("Invalid MessagePack data");
        let err = IpcError::from_framing("Failed to read response", garbage);
        assert!(matches!(err, IpcError::Protocol(_)));
    }

    #[test]
    fn test_connect_refused() {
        // Bind then release a port so nothing is listening on it
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let config = ClientConfig::default()
            .with_host("127.0.0.1")
            .with_port(port)
            .with_connect_timeout(Duration::from_secs(2));

        let err = RpcClient::connect(&config).err().expect("should fail");
        assert!(
            matches!(err, IpcError::ConnectionFailed(_)),
            "Expected ConnectionFailed, got {:?}",
            err
        );
    }
}
