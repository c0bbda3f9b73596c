//! Connection settings for the xflr5 server.
//!
//! Resolution order, later steps overriding earlier ones:
//!
//! 1. Built-in defaults (`localhost:8080`, 5 s connect timeout)
//! 2. The JSON config file, if present (see [`default_config_path`])
//! 3. `XFLR_HOST`, `XFLR_PORT` and `XFLR_CONNECT_TIMEOUT_MS`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Port xflr5 binds its RPC server to unless told otherwise.
pub const DEFAULT_PORT: u16 = 8080;

/// Default connect timeout in milliseconds.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Endpoint and timeout used by [`RpcClient::connect`](crate::ipc::RpcClient::connect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

/// Resolve the default config file location.
///
/// `<config_dir>/xflr-client/config.json`, where `config_dir` is
/// `$XDG_CONFIG_HOME` (or `~/.config`) on Linux and
/// `~/Library/Application Support` on macOS.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("xflr-client").join("config.json"))
}

impl ClientConfig {
    /// Defaults, then the default config file if it exists, then the
    /// environment.
    pub fn resolve() -> Result<Self> {
        let base = match default_config_path() {
            Some(path) if path.exists() => Self::load(&path)?,
            _ => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Apply `XFLR_HOST`, `XFLR_PORT` and `XFLR_CONNECT_TIMEOUT_MS`.
    ///
    /// Unparseable values are logged and skipped.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(host) = lookup("XFLR_HOST") {
            if !host.trim().is_empty() {
                self.host = host.trim().to_string();
            }
        }
        if let Some(port) = lookup("XFLR_PORT") {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid XFLR_PORT={}", port),
            }
        }
        if let Some(ms) = lookup("XFLR_CONNECT_TIMEOUT_MS") {
            match ms.trim().parse() {
                Ok(ms) => self.connect_timeout_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid XFLR_CONNECT_TIMEOUT_MS={}", ms),
            }
        }
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// `host:port` as dialed.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
