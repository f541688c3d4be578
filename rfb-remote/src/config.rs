//! Configuration types for the VNC client.

use crate::errors::RfbClientError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete VNC client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Input settings.
    #[serde(default)]
    pub input: InputConfig,
}

/// Connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Default server IPv4 address for front-ends that do not ask the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Default server port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// VNC password (if required).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Connection timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            password: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Input configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// View-only mode (no pointer events sent to the server).
    #[serde(default)]
    pub view_only: bool,
}

impl Config {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a TOML document.
    ///
    /// Missing sections and keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, RfbClientError> {
        let config: Config = toml::from_str(text)
            .map_err(|e| RfbClientError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfbClientError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            RfbClientError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&text)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), RfbClientError> {
        if self.connection.timeout_ms == 0 {
            return Err(RfbClientError::Config(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }

        if matches!(self.connection.host.as_deref(), Some(h) if h.trim().is_empty()) {
            return Err(RfbClientError::Config("Host cannot be empty".to_string()));
        }

        if self.connection.port == Some(0) {
            return Err(RfbClientError::Config("Port cannot be 0".to_string()));
        }

        Ok(())
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.connection.timeout_ms)
    }
}

/// Builder for creating a `Config`.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Sets the default server address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.connection.host = Some(host.into());
        self
    }

    /// Sets the default server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.connection.port = Some(port);
        self
    }

    /// Sets the VNC password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.connection.password = Some(password.into());
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.connection.timeout_ms = timeout_ms;
        self
    }

    /// Enables or disables view-only mode.
    #[must_use]
    pub fn view_only(mut self, view_only: bool) -> Self {
        self.config.input.view_only = view_only;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Config, RfbClientError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
