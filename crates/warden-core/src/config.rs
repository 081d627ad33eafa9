//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `warden.yaml` next to the binary.
//! This module defines strongly-typed structs mirroring the YAML structure
//! and a loader that reads, validates, and *normalizes* the file: invalid
//! values fall back to safe defaults with a logged warning rather than
//! refusing to start, so a half-edited config never leaves the bridge
//! unreachable on loopback.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Warden configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WardenConfig {
    /// Bind address, port, and auth settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Admission-control limits.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Executor timing.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl WardenConfig {
    /// Load configuration from a YAML file at the given path, then
    /// validate and normalize it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then validate and
    /// normalize it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.normalize();
        Ok(config)
    }

    /// Defaults, already normalized.
    pub fn normalized_default() -> Self {
        let mut config = Self::default();
        config.normalize();
        config
    }

    /// Whether the server is bound to a non-loopback address, which makes
    /// token auth mandatory.
    pub fn lan_mode(&self) -> bool {
        match self.network.bind_address.parse::<IpAddr>() {
            Ok(ip) => !ip.is_loopback(),
            Err(_) => self.network.bind_address != "localhost",
        }
    }

    /// Clamp every field into its documented range, logging each fallback.
    ///
    /// Invariants enforced here, before the core ever sees the values:
    /// port in [1024, 65535]; max-requests-per-minute >= 10;
    /// max-request-body-bytes >= 1024; a non-loopback bind requires both
    /// the explicit allow flag and (when required) a non-empty token, else
    /// the bind is forced back to loopback.
    fn normalize(&mut self) {
        if self.network.bind_address.trim().is_empty() {
            self.network.bind_address = default_bind_address();
        }

        if self.network.port < 1024 {
            warn!(
                port = self.network.port,
                "configured port below 1024, using default"
            );
            self.network.port = default_port();
        }

        if self.security.max_requests_per_minute < 10 {
            warn!(
                max_requests_per_minute = self.security.max_requests_per_minute,
                "rate limit below floor, clamping to 10"
            );
            self.security.max_requests_per_minute = 10;
        }

        if self.security.max_request_body_bytes < 1024 {
            warn!(
                max_request_body_bytes = self.security.max_request_body_bytes,
                "body cap below floor, clamping to 1024"
            );
            self.security.max_request_body_bytes = 1024;
        }

        if self.engine.tick_interval_ms == 0 {
            self.engine.tick_interval_ms = default_tick_interval_ms();
        }

        if self.engine.command_timeout_ms == 0 {
            self.engine.command_timeout_ms = default_command_timeout_ms();
        }

        if self.lan_mode() {
            let token_missing = self.security.require_token_for_lan
                && self.network.auth_token.trim().is_empty();
            if !self.network.allow_lan || token_missing {
                warn!(
                    bind_address = %self.network.bind_address,
                    "LAN bind requested without allow_lan/token, falling back to loopback"
                );
                self.network.bind_address = default_bind_address();
                self.network.allow_lan = false;
            }
        }
    }
}

/// Network-facing settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// TCP port for the HTTP listener.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret for LAN-mode auth. Empty means no token is
    /// configured, which forbids LAN binds when a token is required.
    #[serde(default)]
    pub auth_token: String,

    /// Explicit opt-in for binding to a non-loopback address.
    #[serde(default)]
    pub allow_lan: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            auth_token: String::new(),
            allow_lan: false,
        }
    }
}

/// Admission-control limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecurityConfig {
    /// Whether LAN mode demands a configured token.
    #[serde(default = "default_true")]
    pub require_token_for_lan: bool,

    /// Global sliding-window rate limit.
    #[serde(default = "default_max_requests_per_minute")]
    pub max_requests_per_minute: u32,

    /// Largest request body accepted, in bytes.
    #[serde(default = "default_max_request_body_bytes")]
    pub max_request_body_bytes: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            require_token_for_lan: true,
            max_requests_per_minute: default_max_requests_per_minute(),
            max_request_body_bytes: default_max_request_body_bytes(),
        }
    }
}

/// Executor timing settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Real-time milliseconds between executor ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Bound on the front end's wait for a command result.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl EngineConfig {
    /// The result-wait bound as a [`Duration`].
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

fn default_bind_address() -> String {
    String::from("127.0.0.1")
}

const fn default_port() -> u16 {
    18_800
}

const fn default_true() -> bool {
    true
}

const fn default_max_requests_per_minute() -> u32 {
    60
}

const fn default_max_request_body_bytes() -> usize {
    16_384
}

const fn default_tick_interval_ms() -> u64 {
    250
}

const fn default_command_timeout_ms() -> u64 {
    2_500
}
