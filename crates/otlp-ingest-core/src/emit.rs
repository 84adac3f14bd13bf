//! Emission payloads.
//!
//! Every request produces exactly one [`Emission`]: the flat records (or the
//! raw decoded request in debug mode) plus the metadata a sink needs to write
//! them. Sinks live in the server crate; this module only builds the value.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::decode::Signal;
use crate::flatten::{FlattenStats, Flattener};
use crate::records::{LogRecord, MetricRecord, SpanRecord};

/// What telemetry endpoints emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// Flat span, metric and log records
    #[default]
    Flattened,
    /// The decoded request as received, for debugging producers
    Raw,
}

impl EmitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmitMode::Flattened => "flattened",
            EmitMode::Raw => "raw",
        }
    }
}

impl fmt::Display for EmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flattened" | "flat" => Ok(EmitMode::Flattened),
            "raw" => Ok(EmitMode::Raw),
            other => Err(format!(
                "unsupported emit mode '{}': expected 'flattened' or 'raw'",
                other
            )),
        }
    }
}

/// Body of an emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "records", rename_all = "snake_case")]
pub enum EmissionPayload {
    Spans(Vec<SpanRecord>),
    Metrics(Vec<MetricRecord>),
    Logs(Vec<LogRecord>),
    /// Decoded request in raw mode; `None` when decoding failed.
    Raw(Option<JsonValue>),
    /// Arbitrary JSON posted to the generic ingest endpoint.
    Ingest(JsonValue),
}

impl EmissionPayload {
    /// Number of flat records carried, 0 for raw and ingest payloads.
    pub fn record_count(&self) -> usize {
        match self {
            EmissionPayload::Spans(records) => records.len(),
            EmissionPayload::Metrics(records) => records.len(),
            EmissionPayload::Logs(records) => records.len(),
            EmissionPayload::Raw(_) | EmissionPayload::Ingest(_) => 0,
        }
    }
}

/// The single unit written to a sink per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emission {
    /// `None` for the generic ingest endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,
    #[serde(serialize_with = "crate::timestamp::serialize")]
    pub received_at: DateTime<Utc>,
    pub processed: usize,
    pub payload: EmissionPayload,
}

impl Emission {
    pub fn new(
        signal: Option<Signal>,
        received_at: DateTime<Utc>,
        processed: usize,
        payload: EmissionPayload,
    ) -> Self {
        Self {
            signal,
            received_at,
            processed,
            payload,
        }
    }

    /// Emission for a generic ingest request.
    pub fn ingest(received_at: DateTime<Utc>, payload: JsonValue) -> Self {
        Self::new(None, received_at, 1, EmissionPayload::Ingest(payload))
    }
}

/// Flatten a decoded OTLP request and wrap it for emission.
///
/// The request is always flattened so that the `processed` count and the
/// statistics are the same in both modes; raw mode then emits the decoded
/// value in place of the records.
pub fn telemetry_emission(
    flattener: &Flattener,
    mode: EmitMode,
    signal: Signal,
    decoded: Option<JsonValue>,
    received_at: DateTime<Utc>,
) -> (Emission, FlattenStats) {
    let count_mode = flattener.config().processed_count_mode;
    let value = decoded.as_ref().unwrap_or(&JsonValue::Null);

    let (processed, stats, records) = match signal {
        Signal::Traces => {
            let flattened = flattener.flatten_traces(value, received_at);
            let processed = flattened.processed(count_mode);
            (processed, flattened.stats, EmissionPayload::Spans(flattened.records))
        }
        Signal::Metrics => {
            let flattened = flattener.flatten_metrics(value, received_at);
            let processed = flattened.processed(count_mode);
            (processed, flattened.stats, EmissionPayload::Metrics(flattened.records))
        }
        Signal::Logs => {
            let flattened = flattener.flatten_logs(value, received_at);
            let processed = flattened.processed(count_mode);
            (processed, flattened.stats, EmissionPayload::Logs(flattened.records))
        }
    };

    let payload = match mode {
        EmitMode::Flattened => records,
        EmitMode::Raw => EmissionPayload::Raw(decoded),
    };

    (
        Emission::new(Some(signal), received_at, processed, payload),
        stats,
    )
}
