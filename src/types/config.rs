//! Configuration for calcwire.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::protocol::{DEFAULT_MAX_FRAME_SIZE, MAX_CACHE_CONTROL};
use crate::{CalcError, CalcResult};

/// Main configuration for calcwire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Wire protocol settings.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Evaluator (origin) settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Caching intermediary settings.
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Requester settings.
    #[serde(default)]
    pub client: ClientConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Wire protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Largest frame (length prefix included) accepted or produced.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

/// Evaluator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to listen on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Whether responses may be cached by intermediaries.
    #[serde(default = "default_true")]
    pub cache_result: bool,

    /// Freshness granted to responses, in seconds (65535 = indefinite).
    #[serde(default = "default_cache_control")]
    pub cache_control: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_server_port(),
            cache_result: true,
            cache_control: default_cache_control(),
        }
    }
}

/// Caching intermediary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Host to listen on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_proxy_port")]
    pub port: u16,

    /// Origin evaluator host.
    #[serde(default = "default_host")]
    pub upstream_host: String,

    /// Origin evaluator port.
    #[serde(default = "default_server_port")]
    pub upstream_port: u16,

    /// Deadline for connecting to and round-tripping with the origin (in seconds).
    #[serde(default = "default_origin_timeout")]
    pub origin_timeout_secs: u64,
}

impl ProxyConfig {
    /// Origin deadline as a [`Duration`].
    pub fn origin_timeout(&self) -> Duration {
        Duration::from_secs(self.origin_timeout_secs)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_proxy_port(),
            upstream_host: default_host(),
            upstream_port: default_server_port(),
            origin_timeout_secs: default_origin_timeout(),
        }
    }
}

/// Requester settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Host to connect to (evaluator or intermediary).
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to connect to.
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Ask for the reduction trace.
    #[serde(default = "default_true")]
    pub show_steps: bool,

    /// Allow intermediaries to cache the exchange.
    #[serde(default = "default_true")]
    pub cache_result: bool,

    /// Maximum acceptable age in seconds (0 = force refetch, 65535 = indefinite).
    #[serde(default = "default_cache_control")]
    pub cache_control: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_server_port(),
            show_steps: true,
            cache_result: true,
            cache_control: default_cache_control(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    9999
}

fn default_proxy_port() -> u16 {
    9998
}

fn default_cache_control() -> u32 {
    MAX_CACHE_CONTROL
}

fn default_origin_timeout() -> u64 {
    10
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> CalcResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CalcResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            protocol: ProtocolConfig::default(),
            server: ServerConfig::default(),
            proxy: ProxyConfig::default(),
            client: ClientConfig::default(),
        }
    }

    /// Tries to load configuration from current directory or uses default.
    pub fn load_or_default() -> Self {
        Self::load("calcwire.toml").unwrap_or_else(|_| Self::default_config())
    }

    /// Rejects values the wire format cannot carry.
    pub fn validate(&self) -> CalcResult<()> {
        for (section, value) in [
            ("server", self.server.cache_control),
            ("client", self.client.cache_control),
        ] {
            if value > MAX_CACHE_CONTROL {
                return Err(CalcError::config(format!(
                    "{section}.cache_control = {value} exceeds {MAX_CACHE_CONTROL}"
                )));
            }
        }
        if self.protocol.max_frame_bytes < crate::protocol::HEADER_SIZE {
            return Err(CalcError::config(format!(
                "protocol.max_frame_bytes = {} is smaller than the {}-byte header",
                self.protocol.max_frame_bytes,
                crate::protocol::HEADER_SIZE
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
