// Configuration source loading.
//
// Priority order:
// 1. Environment variables (INGEST_* prefix, plus the bare PORT)
// 2. Config file path from INGEST_CONFIG
// 3. Inline config content from INGEST_CONFIG_CONTENT
// 4. Default config files (./config.toml, ./.otlp-ingest.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_FILES: [&str; 2] = ["./config.toml", "./.otlp-ingest.toml"];

/// Load configuration from the environment and the standard file locations.
pub fn load_config() -> Result<RuntimeConfig> {
    let mut config = load_from_file()?.unwrap_or_default();

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = env::var(format!("{}CONFIG", ENV_PREFIX)) {
        return read_config_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var(format!("{}CONFIG_CONTENT", ENV_PREFIX)) {
        let config = RuntimeConfig::from_toml_str(&content)
            .context("Failed to parse inline config from INGEST_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in DEFAULT_CONFIG_FILES {
        let path = Path::new(path);
        if path.exists() {
            return read_config_file(path).map(Some);
        }
    }

    Ok(None)
}

fn read_config_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    RuntimeConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
/// Environment overrides still apply on top of the file.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let mut config = read_config_file(path.as_ref())?;

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogFormat;
    use std::io::Write;

    #[test]
    fn reads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nlisten_addr = \"127.0.0.1:9999\"\nlog_format = \"json\""
        )
        .unwrap();

        let config = read_config_file(file.path()).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9999");
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.ingest.append_log_path, "./data/ingest.log");
    }

    #[test]
    fn missing_or_invalid_files_are_errors() {
        assert!(read_config_file(Path::new("/nonexistent/ingest.toml")).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nlisten_addr = 1").unwrap();
        let err = read_config_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
