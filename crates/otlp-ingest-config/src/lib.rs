// otlp-ingest-config - Runtime configuration for the ingest server
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from INGEST_CONFIG env var
// 3. Config file contents from INGEST_CONFIG_CONTENT env var
// 4. Default config file locations (./config.toml, ./.otlp-ingest.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};
pub use otlp_ingest_core::{EmitMode, FlattenConfig, ProcessedCountMode};
pub use sources::{load_config, load_from_file_path};

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub request: RequestConfig,

    #[serde(default)]
    pub flatten: FlattenConfig,

    #[serde(default)]
    pub emit: EmitConfig,

    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:4318".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Replace the port of `listen_addr`, keeping the host.
    pub fn set_port(&mut self, port: u16) {
        let host = self
            .listen_addr
            .rsplit_once(':')
            .map(|(host, _)| host)
            .filter(|host| !host.is_empty())
            .unwrap_or("0.0.0.0");
        self.listen_addr = format!("{}:{}", host, port);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Request handling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub max_payload_bytes: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Where and how emissions are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    pub mode: EmitMode,
    pub sink: SinkKind,
    /// Pretty-print console output
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// One JSON document per emission on stdout
    #[default]
    Console,
    /// One `tracing` event per emission
    Tracing,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkKind::Console => write!(f, "console"),
            SinkKind::Tracing => write!(f, "tracing"),
        }
    }
}

impl std::str::FromStr for SinkKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "console" | "stdout" => Ok(SinkKind::Console),
            "tracing" | "log" => Ok(SinkKind::Tracing),
            _ => anyhow::bail!("Unsupported sink: {}. Supported: console, tracing", s),
        }
    }
}

/// Generic ingest endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// JSON-lines file that `POST /ingest` appends to
    pub append_log_path: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            append_log_path: "./data/ingest.log".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Parse a TOML document; missing sections and fields take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
