use crate::{LogFormat, ProcessedCountMode, RuntimeConfig, SinkKind};
use anyhow::{anyhow, bail, Context, Result};

pub const ENV_PREFIX: &str = "INGEST_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the INGEST_ prefix
    /// Used for the conventional `PORT` variable
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Server configuration (listen addr, port, log level/format)
    if let Some(addr) = get_env_string(env, "LISTEN_ADDR")? {
        config.server.listen_addr = addr;
    }
    if let Some(port) = get_raw_env_u16(env, "PORT")? {
        config.server.set_port(port);
    }
    if let Some(port) = get_env_u16(env, "PORT")? {
        config.server.set_port(port);
    }
    if let Some(level) = get_env_string(env, "LOG_LEVEL")? {
        config.server.log_level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT")? {
        config.server.log_format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }

    // Request configuration
    if let Some(val) = get_env_usize(env, "MAX_PAYLOAD_BYTES")? {
        config.request.max_payload_bytes = val;
    }

    // Flattening
    if let Some(filters) = get_env_string(env, "HEALTH_CHECK_PATH_FILTERS")? {
        config.flatten.health_check_path_filters = filters
            .split(',')
            .map(str::trim)
            .filter(|filter| !filter.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(mode) = get_env_string(env, "PROCESSED_COUNT_MODE")? {
        config.flatten.processed_count_mode = parse_processed_count_mode(&mode)?;
    }

    // Emission
    if let Some(mode) = get_env_string(env, "EMIT_MODE")? {
        config.emit.mode = mode
            .parse()
            .map_err(|e: String| anyhow!("Invalid {}EMIT_MODE value: {}", ENV_PREFIX, e))?;
    }
    if let Some(sink) = get_env_string(env, "EMIT_SINK")? {
        config.emit.sink = sink
            .parse::<SinkKind>()
            .context("Invalid INGEST_EMIT_SINK value")?;
    }
    if let Some(pretty) = get_env_bool(env, "EMIT_PRETTY")? {
        config.emit.pretty = pretty;
    }

    // Generic ingest
    if let Some(path) = get_env_string(env, "APPEND_LOG_PATH")? {
        config.ingest.append_log_path = path;
    }

    Ok(())
}

fn parse_processed_count_mode(value: &str) -> Result<ProcessedCountMode> {
    match value.to_lowercase().as_str() {
        "resource_groups" | "groups" => Ok(ProcessedCountMode::ResourceGroups),
        "flat_records" | "records" => Ok(ProcessedCountMode::FlatRecords),
        _ => bail!(
            "Invalid {}PROCESSED_COUNT_MODE value: {}. Supported: resource_groups, flat_records",
            ENV_PREFIX,
            value
        ),
    }
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get(key))
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_u16<E: EnvSource>(env: &E, key: &str) -> Result<Option<u16>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<u16>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Get a port from an environment variable without the INGEST_ prefix
fn get_raw_env_u16<E: EnvSource>(env: &E, key: &str) -> Result<Option<u16>> {
    match env.get_raw(key) {
        Some(val) => {
            let parsed = val
                .parse::<u16>()
                .map_err(|e| anyhow!("Failed to parse {}: {}", key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val.parse::<bool>().map_err(|e| {
                anyhow!(
                    "Failed to parse {}{} (expected bool): {}",
                    ENV_PREFIX,
                    key,
                    e
                )
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmitMode;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapEnv {
        prefixed: HashMap<&'static str, &'static str>,
        raw: HashMap<&'static str, &'static str>,
    }

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.prefixed.get(key).map(|v| v.to_string())
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.raw.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn test_overrides_apply() {
        let env = MapEnv {
            prefixed: HashMap::from([
                ("LOG_LEVEL", "debug"),
                ("LOG_FORMAT", "JSON"),
                ("MAX_PAYLOAD_BYTES", "1024"),
                ("HEALTH_CHECK_PATH_FILTERS", "/health, /ready,,"),
                ("PROCESSED_COUNT_MODE", "flat_records"),
                ("EMIT_MODE", "raw"),
                ("EMIT_SINK", "tracing"),
                ("EMIT_PRETTY", "true"),
                ("APPEND_LOG_PATH", "/tmp/ingest.log"),
            ]),
            ..Default::default()
        };
        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.request.max_payload_bytes, 1024);
        assert_eq!(
            config.flatten.health_check_path_filters,
            vec!["/health".to_string(), "/ready".to_string()]
        );
        assert_eq!(
            config.flatten.processed_count_mode,
            ProcessedCountMode::FlatRecords
        );
        assert_eq!(config.emit.mode, EmitMode::Raw);
        assert_eq!(config.emit.sink, SinkKind::Tracing);
        assert!(config.emit.pretty);
        assert_eq!(config.ingest.append_log_path, "/tmp/ingest.log");
    }

    #[test]
    fn test_prefixed_port_wins_over_raw_port() {
        let mut config = RuntimeConfig::default();
        let env = MapEnv {
            raw: HashMap::from([("PORT", "5000")]),
            ..Default::default()
        };
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:5000");

        let env = MapEnv {
            prefixed: HashMap::from([("PORT", "6000")]),
            raw: HashMap::from([("PORT", "5000")]),
        };
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:6000");
    }

    #[test]
    fn test_invalid_values_are_errors() {
        for (key, value) in [
            ("MAX_PAYLOAD_BYTES", "lots"),
            ("EMIT_MODE", "csv"),
            ("EMIT_PRETTY", "yes"),
            ("PROCESSED_COUNT_MODE", "spans"),
            ("PORT", "99999"),
        ] {
            let env = MapEnv {
                prefixed: HashMap::from([(key, value)]),
                ..Default::default()
            };
            let mut config = RuntimeConfig::default();
            assert!(
                apply_env_overrides(&mut config, &env).is_err(),
                "{key}={value} should be rejected"
            );
        }
    }
}
