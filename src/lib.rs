//! xflr5 remote-control client
//!
//! This library drives a running xflr5 instance over its MessagePack-RPC
//! server:
//!
//! - `ipc` - blocking call gateway and the msgpack-rpc transport behind it
//! - `wire` / `marshal` - untyped wire values and typed conversion to and from them
//! - `models` - payload objects and enums exchanged with the server
//! - `foil` / `apps` / `client` - the domain API built on top
//!
//! # Usage
//!
//! ```ignore
//! use xflr_client::{App, Application, ClientConfig, XflrClient};
//!
//! let xp = XflrClient::connect(&ClientConfig::from_env())?;
//! xp.load_project(&["/home/me/projects/test1.xfl"], false)?;
//! xp.set_app(App::DirectDesign)?;
//!
//! let afoil = xp.afoil();
//! let foil = afoil.foils().get_foil("MH 60  10.08%")?;
//! let mut coords = foil.coords()?;
//! coords[10] = (0.1, 0.01).into();
//! foil.set_coords(&coords)?;
//! ```

pub mod apps;
pub mod client;
pub mod config;
pub mod error;
pub mod foil;
pub mod ipc;
pub mod marshal;
pub mod models;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use apps::{AFoil, Miarex, OpPointManager, PlaneManager, PolarManager, XDirect, XInverse};
pub use client::{Application, XflrClient};
pub use config::ClientConfig;
pub use error::Error;
pub use foil::{Foil, FoilManager, GeomChange};
pub use ipc::{Gateway, GatewayExt, IpcError, RpcClient, SharedGateway};
pub use marshal::{DecodeError, FromWire, InvalidEnumError, Shape, ToWire, WireEnum};
pub use models::*;
pub use wire::{WireMap, WireValue};
