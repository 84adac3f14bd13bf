// otlp-ingest-server - HTTP surface for the ingest pipeline
//
// Features:
// - Axum HTTP server (HTTP/1.1, HTTP/2)
// - OTLP traces/metrics/logs, Fluent Bit logs and a generic ingest endpoint
// - Console or tracing sinks for the flat records
// - Structured logging with tracing
// - Graceful shutdown

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use otlp_ingest_config::RuntimeConfig;
use otlp_ingest_core::{EmitMode, Emission, Flattener};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

mod append_log;
mod handlers;
mod init;
mod sink;

pub use append_log::AppendLog;
pub use init::init_tracing;
pub use sink::{sink_from_config, ConsoleSink, MemorySink, RecordSink, TracingSink};

use handlers::{
    handle_fluent_bit_logs, handle_ingest, handle_logs, handle_metrics, handle_traces,
    health_check, not_found,
};

/// Name reported by the health endpoint.
pub const SERVICE_NAME: &str = "ingest-server";

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub(crate) flattener: Arc<Flattener>,
    pub(crate) emit_mode: EmitMode,
    pub(crate) sink: Arc<dyn RecordSink>,
    pub(crate) append_log: Arc<AppendLog>,
}

impl AppState {
    pub fn new(config: &RuntimeConfig, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            flattener: Arc::new(Flattener::new(config.flatten.clone())),
            emit_mode: config.emit.mode,
            sink,
            append_log: Arc::new(AppendLog::new(&config.ingest.append_log_path)),
        }
    }

    /// State with the sink selected by `emit.sink`.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config, sink_from_config(&config.emit))
    }

    /// Write one emission; failures are logged and dropped.
    pub(crate) fn emit(&self, emission: &Emission) {
        if let Err(e) = self.sink.emit(emission) {
            counter!("otlp.ingest.sink_errors").increment(1);
            warn!(
                error = %e,
                processed = emission.processed,
                "Failed to write emission, dropping it"
            );
        }
    }
}

/// Error type that implements IntoResponse
pub(crate) struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request error: {:?}", self.error);
        (
            self.status,
            Json(json!({
                "error": self.error.to_string(),
            })),
        )
            .into_response()
    }
}

impl AppError {
    pub fn bad_request<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
        }
    }
}

/// Build the router with all ingest routes, the 404 fallback and middleware.
///
/// Known paths hit with the wrong method also get the 404 body.
pub fn build_router(state: AppState, max_payload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check).fallback(not_found))
        .route("/v1/traces", post(handle_traces).fallback(not_found))
        .route("/v1/metrics", post(handle_metrics).fallback(not_found))
        .route("/v1/logs", post(handle_logs).fallback(not_found))
        .route(
            "/fluent-bit/logs",
            post(handle_fluent_bit_logs).fallback(not_found),
        )
        .route("/ingest", post(handle_ingest).fallback(not_found))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_payload_bytes)),
        )
        .with_state(state)
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Entry point (loads config automatically)
pub async fn run() -> Result<()> {
    let config = RuntimeConfig::load().context("Failed to load configuration")?;
    run_with_config(config).await
}

/// Entry point with pre-loaded configuration (for CLI usage)
pub async fn run_with_config(config: RuntimeConfig) -> Result<()> {
    init_tracing(&config);

    info!(
        "Ingest server - {} emission to the {} sink",
        config.emit.mode, config.emit.sink
    );
    info!(
        processed_count_mode = ?config.flatten.processed_count_mode,
        health_check_path_filters = ?config.flatten.health_check_path_filters,
        "Flattener configured"
    );

    let addr = config.server.listen_addr.clone();
    let max_payload_bytes = config.request.max_payload_bytes;
    info!("Max payload size set to {} bytes", max_payload_bytes);

    let state = AppState::from_config(&config);
    info!(
        "Generic ingest payloads append to {}",
        state.append_log.path().display()
    );

    let app = build_router(state, max_payload_bytes);

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;

    info!("OTLP HTTP endpoint listening on http://{}", addr);
    info!("Routes:");
    info!("  POST http://{}/v1/traces      - OTLP trace ingestion", addr);
    info!("  POST http://{}/v1/metrics     - OTLP metrics ingestion", addr);
    info!("  POST http://{}/v1/logs        - OTLP log ingestion (JSON)", addr);
    info!("  POST http://{}/fluent-bit/logs - Fluent Bit log batches", addr);
    info!("  POST http://{}/ingest         - Generic JSON ingest", addr);
    info!("  GET  http://{}/health         - Health check", addr);
    info!("Press Ctrl+C or send SIGTERM to stop");

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");

    Ok(())
}
