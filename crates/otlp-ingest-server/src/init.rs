// Logging/tracing setup

use otlp_ingest_config::{LogFormat, RuntimeConfig};
use tracing::debug;

/// Initialize the tracing subscriber from the server configuration.
///
/// Logs go to stderr; stdout belongs to the console sink. Safe to call more
/// than once, later calls keep the first subscriber.
pub fn init_tracing(config: &RuntimeConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Parse log level from config
    let env_filter =
        EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.server.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    if installed.is_err() {
        debug!("Tracing subscriber already installed");
    }
}
