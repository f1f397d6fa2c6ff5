//! Gateway Configuration

use crate::error::GatewayError;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use healing_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use telemetry::ports;

/// Environment variable prefix, e.g. `NEURODRIVE__NETWORK__LISTEN_ADDR`
pub const ENV_PREFIX: &str = "NEURODRIVE";

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub network: NetworkConfig,

    /// Detection engine
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Sockets and queues
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Telemetry listen address
    pub listen_addr: SocketAddr,
    /// Where commands are sent
    pub command_addr: SocketAddr,
    /// Capacity of the sample and command queues
    pub queue_capacity: usize,
    /// Largest datagram accepted (bytes)
    pub max_packet_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], ports::TELEMETRY)),
            command_addr: SocketAddr::from(([127, 0, 0, 1], ports::COMMAND)),
            queue_capacity: 256,
            max_packet_size: 4096,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Prometheus exporter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Scrape endpoint; no exporter when unset
    pub listen_addr: Option<SocketAddr>,
}

impl GatewayConfig {
    /// Load configuration: defaults, then the optional file, then environment
    pub fn load(path: Option<&str>) -> Result<Self, GatewayError> {
        let mut builder = Self::defaults()?;

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse a TOML document layered over the defaults
    pub fn from_toml(toml: &str) -> Result<Self, GatewayError> {
        let builder = Self::defaults()?.add_source(File::from_str(toml, FileFormat::Toml));
        Ok(builder.build()?.try_deserialize()?)
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, GatewayError> {
        Ok(Config::builder().add_source(Config::try_from(&GatewayConfig::default())?))
    }
}
