// HTTP request handlers
//
// Telemetry endpoints always answer 200 for a routed request: payloads that
// fail to decode are treated as empty and the failure is only logged.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use metrics::{counter, histogram};
use otlp_ingest_core::{
    decode_payload, sanitize_batch, telemetry_emission, timestamp::format_millis, EmitMode,
    Emission, EmissionPayload, InputFormat, Signal,
};
use serde_json::{json, Value as JsonValue};
use std::time::Instant;
use tracing::{debug, warn};

use crate::{AppError, AppState, SERVICE_NAME};

/// POST /v1/traces - OTLP trace ingestion endpoint
pub(crate) async fn handle_traces(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<JsonValue> {
    handle_signal(Signal::Traces, &state, &headers, &body)
}

/// POST /v1/metrics - OTLP metrics ingestion endpoint
pub(crate) async fn handle_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<JsonValue> {
    handle_signal(Signal::Metrics, &state, &headers, &body)
}

/// POST /v1/logs - OTLP log ingestion endpoint (JSON only)
pub(crate) async fn handle_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<JsonValue> {
    handle_signal(Signal::Logs, &state, &headers, &body)
}

/// GET /health - Basic health check
pub(crate) async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "timestamp": format_millis(&Utc::now()),
            "service": SERVICE_NAME,
        })),
    )
}

fn handle_signal(
    signal: Signal,
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Json<JsonValue> {
    let start = Instant::now();
    let received_at = Utc::now();
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let format = InputFormat::from_content_type(content_type);

    debug!(
        "Received OTLP {} request ({} bytes, format: {:?}, content-type: {:?})",
        signal.as_str(),
        body.len(),
        format,
        content_type
    );
    counter!("otlp.ingest.requests", "signal" => signal.as_str()).increment(1);
    histogram!("otlp.ingest.bytes", "signal" => signal.as_str()).record(body.len() as f64);

    let decoded = decode_payload(signal, format, body);
    if decoded.error.is_some() {
        counter!("otlp.ingest.decode_errors", "signal" => signal.as_str()).increment(1);
    }
    let decoded = (!decoded.is_null()).then_some(decoded.value);

    let (emission, stats) = telemetry_emission(
        &state.flattener,
        state.emit_mode,
        signal,
        decoded,
        received_at,
    );
    let records = emission.payload.record_count();

    debug!(
        signal = signal.as_str(),
        resource_groups = stats.resource_groups,
        scope_groups = stats.scope_groups,
        records,
        filtered = stats.filtered,
        skipped = stats.skipped.total(),
        invalid_records = stats.invalid_records,
        nested_attributes_dropped = stats.nested_attributes_dropped,
        "flatten"
    );
    counter!("otlp.ingest.records", "signal" => signal.as_str()).increment(records as u64);
    if stats.filtered > 0 {
        counter!("otlp.ingest.filtered", "signal" => signal.as_str())
            .increment(stats.filtered as u64);
    }
    if stats.skipped.total() > 0 {
        counter!("otlp.ingest.metrics.skipped").increment(stats.skipped.total() as u64);
    }

    let processed = emission.processed;
    state.emit(&emission);

    histogram!("otlp.ingest.latency_ms", "signal" => signal.as_str())
        .record(start.elapsed().as_secs_f64() * 1000.0);

    Json(json!({
        "status": "success",
        "processed": processed,
    }))
}

/// POST /fluent-bit/logs - batches of structured log lines from a log shipper
pub(crate) async fn handle_fluent_bit_logs(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<JsonValue> {
    let received_at = Utc::now();
    counter!("otlp.ingest.requests", "signal" => "fluent_bit").increment(1);
    histogram!("otlp.ingest.bytes", "signal" => "fluent_bit").record(body.len() as f64);

    let decoded = decode_payload(Signal::Logs, InputFormat::Json, &body);
    let sanitized = sanitize_batch(&decoded.value, state.flattener.config());
    let processed = sanitized.processed;
    let discarded = sanitized.discarded;

    debug!(
        processed,
        discarded,
        filtered = sanitized.filtered,
        "Sanitized Fluent Bit batch"
    );
    counter!("otlp.ingest.records", "signal" => "fluent_bit").increment(processed as u64);
    if discarded > 0 {
        counter!("otlp.ingest.discarded").increment(discarded as u64);
    }

    let payload = match state.emit_mode {
        EmitMode::Flattened => EmissionPayload::Logs(sanitized.records),
        EmitMode::Raw => EmissionPayload::Raw((!decoded.is_null()).then_some(decoded.value)),
    };
    state.emit(&Emission::new(
        Some(Signal::Logs),
        received_at,
        processed,
        payload,
    ));

    Json(json!({
        "status": "success",
        "processed": processed,
        "discarded": discarded,
    }))
}

/// POST /ingest - arbitrary JSON, appended to the ingest log
pub(crate) async fn handle_ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<JsonValue>, AppError> {
    let received_at = Utc::now();
    counter!("otlp.ingest.requests", "signal" => "ingest").increment(1);

    let payload: JsonValue = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid JSON body: {}", e)))?;

    debug!(bytes = body.len(), "Received generic ingest payload");

    state.append_log.spawn_append(received_at, payload.clone());
    state.emit(&Emission::ingest(received_at, payload));

    Ok(Json(json!({
        "status": "success",
        "message": "Data ingested",
        "timestamp": format_millis(&received_at),
    })))
}

/// Catch-all for unknown routes
pub(crate) async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    warn!(method = %method, path = uri.path(), "Unknown route");
    counter!("otlp.ingest.not_found").increment(1);
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not found",
            "method": method.as_str(),
            "path": uri.path(),
        })),
    )
}
