//! Call gateway to the remote xflr5 application.
//!
//! The remote side is an rpclib MessagePack-RPC server embedded in xflr5.
//! Everything the client does goes through one primitive,
//! [`Gateway::invoke`]: a method name plus positional wire arguments in, a
//! raw wire value out.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐           TCP            ┌─────────────────────┐
//! │  managers/apps   │                          │   xflr5 xflServer   │
//! │       │          │  [0, id, method, args]   │      (rpclib)       │
//! │   RpcClient  ────┼─────────────────────────►│                     │
//! │  (Gateway impl)◄─┼──────────────────────────┤                     │
//! └──────────────────┘  [1, id, error, result]  └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use xflr_client::ipc::{Gateway, GatewayExt, RpcClient};
//!
//! let client = RpcClient::connect(&ClientConfig::from_env())?;
//! let exists: bool = client.call("foilExists", &["NACA 2412".into()])?;
//! ```

mod client;
mod framing;
mod protocol;

use std::sync::Arc;

use crate::error::Error;
use crate::marshal::FromWire;
use crate::wire::WireValue;

pub use client::{IpcError, RpcClient};
pub use framing::{read_message, write_message};
pub use protocol::{Request, Response};

/// The call primitive every domain operation is built on.
///
/// Implementations must deliver calls to the remote side in the order they
/// are issued and must not overlap them.
pub trait Gateway: Send + Sync {
    /// Invoke `method` with positional `args` and return the raw result.
    fn invoke(&self, method: &str, args: &[WireValue]) -> Result<WireValue, IpcError>;
}

/// Gateway handle shared by managers and live objects.
pub type SharedGateway = Arc<dyn Gateway>;

/// Typed convenience on top of [`Gateway::invoke`].
pub trait GatewayExt: Gateway {
    /// Invoke `method` and decode the result as `R`.
    fn call<R: FromWire>(&self, method: &str, args: &[WireValue]) -> Result<R, Error> {
        let raw = self.invoke(method, args)?;
        R::from_wire(&raw).map_err(|source| Error::Decode {
            method: method.to_string(),
            source,
        })
    }
}

impl<G: Gateway + ?Sized> GatewayExt for G {}
