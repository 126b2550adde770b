//! Server configuration parsing and validation.

use std::net::SocketAddr;

use serde::Deserialize;

use crate::{AppError, Result};

fn default_bind_addr() -> String {
    "0.0.0.0:50051".into()
}

fn default_log_channel_capacity() -> usize {
    1024
}

fn default_update_channel_capacity() -> usize {
    32
}

/// Runtime server configuration, parsed from TOML.
///
/// Every field has a default, so an empty document is a valid
/// configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Socket address the gRPC server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Buffered capacity of the per-invocation log channel. Lines beyond
    /// this suspend the emitting agent until the relay catches up.
    #[serde(default = "default_log_channel_capacity")]
    pub log_channel_capacity: usize,
    /// Buffered capacity of the per-invocation outbound update channel.
    #[serde(default = "default_update_channel_capacity")]
    pub update_channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            log_channel_capacity: default_log_channel_capacity(),
            update_channel_capacity: default_update_channel_capacity(),
        }
    }
}

impl ServerConfig {
    /// Parse and validate configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the document does not parse or a
    /// field fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolved socket address for `bind_addr`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when `bind_addr` is not a valid socket
    /// address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr.parse().map_err(|err| {
            AppError::Config(format!("invalid bind_addr '{}': {err}", self.bind_addr))
        })
    }

    fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.log_channel_capacity == 0 {
            return Err(AppError::Config(
                "log_channel_capacity must be non-zero".into(),
            ));
        }
        if self.update_channel_capacity == 0 {
            return Err(AppError::Config(
                "update_channel_capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
