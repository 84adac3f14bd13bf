// Payload decoding
//
// Turns raw request bytes plus the declared content type into one generic
// nested value in OTLP JSON shape, whatever the wire encoding was. Decode
// failures are absorbed here: the caller gets a null value and the error for
// logging, never a reason to fail the request.

mod proto_json;

use std::fmt;

use opentelemetry_proto::tonic::collector::{
    metrics::v1::ExportMetricsServiceRequest, trace::v1::ExportTraceServiceRequest,
};
use prost::Message;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::warn;

pub use proto_json::{metrics_request_to_json, trace_request_to_json};

use crate::field_names::otlp;
use crate::json::array;

/// OpenTelemetry signal carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Traces,
    Metrics,
    Logs,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Traces => "traces",
            Signal::Metrics => "metrics",
            Signal::Logs => "logs",
        }
    }

    /// Number of resource groups (`resourceSpans` etc.) in a decoded value.
    pub fn resource_groups(&self, decoded: &JsonValue) -> usize {
        let name = match self {
            Signal::Traces => otlp::RESOURCE_SPANS,
            Signal::Metrics => otlp::RESOURCE_METRICS,
            Signal::Logs => otlp::RESOURCE_LOGS,
        };
        array(decoded, name).len()
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported input formats for OTLP payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Binary protobuf
    Protobuf,
    /// JSON, the fallback for any other or missing content type
    Json,
}

impl InputFormat {
    /// Detect format from the Content-Type header.
    ///
    /// Only `application/x-protobuf` selects the binary path; anything else,
    /// including a missing header, is treated as JSON.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.to_ascii_lowercase().contains("application/x-protobuf") => {
                Self::Protobuf
            }
            _ => Self::Json,
        }
    }

    /// Get the canonical Content-Type string for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Protobuf => "application/x-protobuf",
            Self::Json => "application/json",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to decode OTLP {signal} protobuf payload: {source}")]
    Protobuf {
        signal: Signal,
        #[source]
        source: prost::DecodeError,
    },
    #[error("failed to parse OTLP {signal} JSON payload: {source}")]
    Json {
        signal: Signal,
        #[source]
        source: serde_json::Error,
    },
    #[error("binary OTLP {signal} payloads are not supported, send JSON instead")]
    UnsupportedBinary { signal: Signal },
}

/// Outcome of decoding one request body.
#[derive(Debug)]
pub struct Decoded {
    /// The decoded request, `Null` when the body was empty or undecodable.
    pub value: JsonValue,
    /// Why decoding failed, if it did.
    pub error: Option<DecodeError>,
}

impl Decoded {
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

/// Decode a request body, absorbing failures into a null value.
pub fn decode_payload(signal: Signal, format: InputFormat, body: &[u8]) -> Decoded {
    match try_decode_payload(signal, format, body) {
        Ok(value) => Decoded { value, error: None },
        Err(error) => {
            warn!(
                signal = signal.as_str(),
                bytes = body.len(),
                error = %error,
                "Failed to decode OTLP payload, continuing with an empty request"
            );
            Decoded {
                value: JsonValue::Null,
                error: Some(error),
            }
        }
    }
}

/// Decode a request body, surfacing the failure.
pub fn try_decode_payload(
    signal: Signal,
    format: InputFormat,
    body: &[u8],
) -> Result<JsonValue, DecodeError> {
    match format {
        InputFormat::Protobuf => decode_protobuf(signal, body),
        InputFormat::Json => decode_json(signal, body),
    }
}

fn decode_protobuf(signal: Signal, body: &[u8]) -> Result<JsonValue, DecodeError> {
    match signal {
        Signal::Traces => ExportTraceServiceRequest::decode(body)
            .map(|request| trace_request_to_json(&request))
            .map_err(|source| DecodeError::Protobuf { signal, source }),
        Signal::Metrics => ExportMetricsServiceRequest::decode(body)
            .map(|request| metrics_request_to_json(&request))
            .map_err(|source| DecodeError::Protobuf { signal, source }),
        Signal::Logs => Err(DecodeError::UnsupportedBinary { signal }),
    }
}

fn decode_json(signal: Signal, body: &[u8]) -> Result<JsonValue, DecodeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(JsonValue::Null);
    }
    serde_json::from_slice(body).map_err(|source| DecodeError::Json { signal, source })
}
