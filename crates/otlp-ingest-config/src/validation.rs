// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_server_config(&config.server)?;
    validate_request_config(&config.request)?;
    validate_flatten_config(&config.flatten)?;
    validate_ingest_config(&config.ingest)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.listen_addr.is_empty() {
        bail!("server.listen_addr must not be empty");
    }

    // Basic validation that it looks like an address
    if !config.listen_addr.contains(':') {
        bail!("server.listen_addr must be in format 'host:port'");
    }

    if config.log_level.trim().is_empty() {
        bail!("server.log_level must not be empty");
    }

    Ok(())
}

fn validate_request_config(config: &RequestConfig) -> Result<()> {
    if config.max_payload_bytes == 0 {
        bail!("request.max_payload_bytes must be greater than 0");
    }

    if config.max_payload_bytes > 512 * 1024 * 1024 {
        // 512 MB
        warn!(
            max_payload_bytes = config.max_payload_bytes,
            "request.max_payload_bytes is very large; may cause memory issues"
        );
    }

    Ok(())
}

fn validate_flatten_config(config: &FlattenConfig) -> Result<()> {
    if config
        .health_check_path_filters
        .iter()
        .any(|filter| filter.trim().is_empty())
    {
        bail!("flatten.health_check_path_filters must not contain empty entries");
    }

    Ok(())
}

fn validate_ingest_config(config: &IngestConfig) -> Result<()> {
    if config.append_log_path.trim().is_empty() {
        bail!("ingest.append_log_path must not be empty");
    }

    Ok(())
}
