use anyhow::{Context, Result};
use clap::Parser;
use otlp_ingest::config::{load_config, load_from_file_path, EmitMode, RuntimeConfig};
use std::path::PathBuf;

/// OTLP ingest server normalizing traces, metrics and logs into flat records
#[derive(Parser)]
#[command(name = "ingest-server")]
#[command(version)]
#[command(about = "OTLP ingest server normalizing traces, metrics and logs into flat records", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP listen port (overrides config file and environment)
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// What telemetry endpoints emit: flattened or raw
    #[arg(short, long, value_name = "MODE")]
    emit_mode: Option<EmitMode>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build tokio runtime and run async server
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Load base configuration
    let mut config = if let Some(config_path) = &cli.config {
        load_from_file_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        load_config().context("Failed to load configuration")?
    };

    // Step 2: Apply CLI overrides (highest priority)
    apply_cli_overrides(&mut config, &cli);
    config.validate()?;

    // Step 3: Run server with resolved config
    otlp_ingest::run_with_config(config).await
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        config.server.set_port(port);
    }

    if let Some(level) = &cli.log_level {
        config.server.log_level = level.clone();
    }

    if let Some(mode) = cli.emit_mode {
        config.emit.mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otlp_ingest::config::LogFormat;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "ingest-server",
            "--port",
            "9000",
            "--log-level",
            "debug",
            "--emit-mode",
            "raw",
        ]);
        let mut config = RuntimeConfig::default();
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.log_format, LogFormat::Text);
        assert_eq!(config.emit.mode, EmitMode::Raw);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::parse_from(["ingest-server"]);
        let mut config = RuntimeConfig::default();
        apply_cli_overrides(&mut config, &cli);
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_invalid_emit_mode_is_rejected() {
        assert!(Cli::try_parse_from(["ingest-server", "--emit-mode", "csv"]).is_err());
    }
}
