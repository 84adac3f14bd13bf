// Flat record schema
//
// One record per leaf signal instance. Records are built fresh for a request,
// handed to the emitter and dropped; nothing mutates them after construction.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::attributes::Labels;

/// Span status, mapped from the OTLP numeric status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanStatus {
    Ok,
    Error,
    Unset,
}

impl SpanStatus {
    /// 2 → ERROR, 1 → OK, anything else → UNSET.
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Error,
            1 => Self::Ok,
            _ => Self::Unset,
        }
    }

    /// Accepts the proto enum names the binary decoder renders.
    pub fn from_name(name: &str) -> Self {
        match name {
            "STATUS_CODE_ERROR" | "ERROR" => Self::Error,
            "STATUS_CODE_OK" | "OK" => Self::Ok,
            other => other
                .parse::<i64>()
                .map(Self::from_code)
                .unwrap_or(Self::Unset),
        }
    }
}

/// Span kind, mapped from the OTLP enum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanKind {
    Unspecified,
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

impl SpanKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Internal,
            2 => Self::Server,
            3 => Self::Client,
            4 => Self::Producer,
            5 => Self::Consumer,
            _ => Self::Unspecified,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "SPAN_KIND_INTERNAL" => Self::Internal,
            "SPAN_KIND_SERVER" => Self::Server,
            "SPAN_KIND_CLIENT" => Self::Client,
            "SPAN_KIND_PRODUCER" => Self::Producer,
            "SPAN_KIND_CONSUMER" => Self::Consumer,
            other => other
                .parse::<i64>()
                .map(Self::from_code)
                .unwrap_or(Self::Unspecified),
        }
    }
}

/// Metric payload kinds the flattener extracts values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Gauge,
    Sum,
    Histogram,
}

/// One flattened OTLP span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanRecord {
    #[serde(serialize_with = "crate::timestamp::serialize")]
    pub timestamp: DateTime<Utc>,
    pub service_name: String,
    pub environment: String,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub duration_ms: f64,
    pub status: SpanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub kind: SpanKind,
    pub http_method: Option<String>,
    pub http_path: Option<String>,
    pub http_status_code: Option<i64>,
    pub labels: Labels,
}

/// One flattened metric data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    #[serde(serialize_with = "crate::timestamp::serialize")]
    pub timestamp: DateTime<Utc>,
    pub service_name: String,
    pub environment: String,
    pub metric_name: String,
    pub metric_kind: MetricKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// `None` when no finite numeric field could be extracted.
    pub value: Option<f64>,
    pub labels: Labels,
}

/// Normalized structured-log entry.
///
/// Built from OTLP log records or from shipped (Fluent Bit) entries. Every
/// optional field is always present in the serialized form so downstream
/// consumers see one shape regardless of source completeness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
    pub service_name: String,
    pub environment: Option<String>,
    pub level: String,
    pub message: String,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub context: Option<String>,
    pub http_method: Option<String>,
    pub http_path: Option<String>,
    pub http_status_code: Option<i64>,
    pub duration_ms: Option<f64>,
    pub client_ip: Option<String>,
    pub stack: Option<String>,
}

impl LogRecord {
    pub const DEFAULT_TYPE: &'static str = "log";
    pub const DEFAULT_LEVEL: &'static str = "INFO";

    /// A record is kept only with a timestamp, a service name and a message.
    pub fn is_valid(&self) -> bool {
        !self.timestamp.is_empty() && !self.service_name.is_empty() && !self.message.is_empty()
    }
}

impl Default for LogRecord {
    fn default() -> Self {
        Self {
            kind: Self::DEFAULT_TYPE.to_string(),
            timestamp: String::new(),
            service_name: String::new(),
            environment: None,
            level: Self::DEFAULT_LEVEL.to_string(),
            message: String::new(),
            trace_id: None,
            span_id: None,
            context: None,
            http_method: None,
            http_path: None,
            http_status_code: None,
            duration_ms: None,
            client_ip: None,
            stack: None,
        }
    }
}
