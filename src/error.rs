//! Crate-level error type.

use thiserror::Error;

use crate::ipc::IpcError;
use crate::marshal::{DecodeError, InvalidEnumError};

/// Errors returned by domain operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or remote-reported error.
    #[error(transparent)]
    Ipc(#[from] IpcError),

    /// The response did not have the shape the caller asked for.
    #[error("Failed to decode `{method}` response: {source}")]
    Decode {
        method: String,
        #[source]
        source: DecodeError,
    },

    /// A raw integer could not be coerced into an enum.
    #[error(transparent)]
    InvalidEnum(#[from] InvalidEnumError),

    /// The remote application has no entity by that name.
    #[error("{kind} `{name}` not found")]
    NotFound { kind: &'static str, name: String },

    /// A request was rejected before reaching the remote application.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A live operation was attempted on an object built without a gateway.
    #[error("`{0}` is a detached snapshot and cannot reach the server")]
    Detached(String),
}

impl Error {
    /// Connection could not be established or was lost.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Error::Ipc(
                IpcError::ConnectionFailed(_)
                    | IpcError::ConnectTimeout { .. }
                    | IpcError::Disconnected
                    | IpcError::Io(_)
            )
        )
    }

    /// The remote application itself reported the failure.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Ipc(IpcError::Remote { .. }))
    }

    /// The payload could not be decoded, at envelope or shape level.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::Decode { .. } | Error::Ipc(IpcError::Protocol(_) | IpcError::Malformed(_))
        )
    }

    /// An integer had no matching enum constant, standalone or inside a
    /// decoded object.
    pub fn is_invalid_enum(&self) -> bool {
        match self {
            Error::InvalidEnum(_) => true,
            Error::Decode { source, .. } => {
                matches!(source.root_cause(), DecodeError::InvalidEnum(_))
            }
            _ => false,
        }
    }
}
