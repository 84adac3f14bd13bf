// Flattening of decoded OTLP requests
//
// Walks resource → scope → signal → data point and produces one flat record
// per leaf. Every level is optional: a missing or mistyped container yields
// zero records for that branch and never an error. The walk is a pure
// function of the decoded value and the caller-supplied `received_at`, so
// flattening the same request twice gives identical records.

mod logs;
mod metrics;
mod traces;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::attributes::{AttributeMap, Labels};
use crate::field_names::otlp::{self, FieldName};
use crate::field_names::semconv;
use crate::json::{array, field, first_array, lenient_u64};
use crate::records::{LogRecord, MetricRecord, SpanRecord};
use crate::timestamp::nanos_to_datetime;
use crate::{UNKNOWN_ENVIRONMENT, UNKNOWN_SERVICE_NAME};

/// How the `processed` count of a telemetry response is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessedCountMode {
    /// Number of resource groups in the request
    #[default]
    ResourceGroups,
    /// Number of flat records produced
    FlatRecords,
}

/// Flattening options, fixed for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    /// Records whose HTTP path contains any of these substrings are dropped.
    /// Empty disables filtering.
    pub health_check_path_filters: Vec<String>,
    pub processed_count_mode: ProcessedCountMode,
}

/// Data points the flattener does not extract values from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricSkipCounts {
    /// Exponential histogram data points
    pub exponential_histograms: usize,
    /// Summary data points
    pub summaries: usize,
    /// Metrics with no recognizable payload kind
    pub unknown_kinds: usize,
}

impl MetricSkipCounts {
    pub fn total(&self) -> usize {
        self.exponential_histograms + self.summaries + self.unknown_kinds
    }
}

/// Counters accumulated during one flattening pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlattenStats {
    pub resource_groups: usize,
    pub scope_groups: usize,
    /// Records dropped by the health-check path filter
    pub filtered: usize,
    /// Array and kvlist attributes left out of label maps
    pub nested_attributes_dropped: usize,
    pub skipped: MetricSkipCounts,
    /// Log records missing a timestamp, service name or message
    pub invalid_records: usize,
}

/// Records produced from one request, with the pass statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened<R> {
    pub records: Vec<R>,
    pub stats: FlattenStats,
}

impl<R> Flattened<R> {
    fn new(records: Vec<R>, stats: FlattenStats) -> Self {
        Self { records, stats }
    }

    /// The `processed` count reported to the client.
    pub fn processed(&self, mode: ProcessedCountMode) -> usize {
        match mode {
            ProcessedCountMode::ResourceGroups => self.stats.resource_groups,
            ProcessedCountMode::FlatRecords => self.records.len(),
        }
    }
}

/// Turns decoded OTLP requests into flat records.
#[derive(Debug, Clone, Default)]
pub struct Flattener {
    config: FlattenConfig,
}

impl Flattener {
    pub fn new(config: FlattenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// One record per span.
    pub fn flatten_traces(
        &self,
        decoded: &JsonValue,
        received_at: DateTime<Utc>,
    ) -> Flattened<SpanRecord> {
        traces::flatten(self, decoded, received_at)
    }

    /// One record per gauge, sum or histogram data point.
    pub fn flatten_metrics(
        &self,
        decoded: &JsonValue,
        received_at: DateTime<Utc>,
    ) -> Flattened<MetricRecord> {
        metrics::flatten(self, decoded, received_at)
    }

    /// One record per valid OTLP log record.
    pub fn flatten_logs(
        &self,
        decoded: &JsonValue,
        received_at: DateTime<Utc>,
    ) -> Flattened<LogRecord> {
        logs::flatten(self, decoded, received_at)
    }

    /// Whether a request path matches a configured health-check filter.
    pub fn is_health_check(&self, path: &str) -> bool {
        is_health_check_path(&self.config.health_check_path_filters, path)
    }
}

pub(crate) fn is_health_check_path(filters: &[String], path: &str) -> bool {
    filters
        .iter()
        .any(|filter| !filter.is_empty() && path.contains(filter.as_str()))
}

/// Container names of one signal's envelope.
struct Envelope {
    resource_groups: FieldName,
    /// Current name first, then the pre-1.0 `instrumentationLibrary*` name
    scope_groups: [FieldName; 2],
    items: FieldName,
}

const TRACES: Envelope = Envelope {
    resource_groups: otlp::RESOURCE_SPANS,
    scope_groups: [otlp::SCOPE_SPANS, otlp::INSTRUMENTATION_LIBRARY_SPANS],
    items: otlp::SPANS,
};

const METRICS: Envelope = Envelope {
    resource_groups: otlp::RESOURCE_METRICS,
    scope_groups: [otlp::SCOPE_METRICS, otlp::INSTRUMENTATION_LIBRARY_METRICS],
    items: otlp::METRICS,
};

const LOGS: Envelope = Envelope {
    resource_groups: otlp::RESOURCE_LOGS,
    scope_groups: [otlp::SCOPE_LOGS, otlp::INSTRUMENTATION_LIBRARY_LOGS],
    items: otlp::LOG_RECORDS,
};

/// Visit every signal item of a request with its resource context.
fn walk<F>(decoded: &JsonValue, envelope: &Envelope, stats: &mut FlattenStats, mut visit: F)
where
    F: FnMut(&ResourceContext, &JsonValue, &mut FlattenStats),
{
    for resource_group in array(decoded, envelope.resource_groups) {
        stats.resource_groups += 1;
        let resource = field(resource_group, otlp::RESOURCE).unwrap_or(&JsonValue::Null);
        let context = ResourceContext::new(resource, &mut stats.nested_attributes_dropped);

        for scope_group in first_array(resource_group, &envelope.scope_groups) {
            stats.scope_groups += 1;
            for item in array(scope_group, envelope.items) {
                visit(&context, item, stats);
            }
        }
    }
}

/// Identity and labels shared by every record of one resource group.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResourceContext {
    pub service_name: String,
    pub environment: String,
    pub labels: Labels,
}

impl ResourceContext {
    fn new(resource: &JsonValue, nested_dropped: &mut usize) -> Self {
        let attributes = AttributeMap::of(resource);
        let service_name = attributes
            .first_text(&[semconv::SERVICE_NAME, semconv::HOST_NAME])
            .unwrap_or_else(|| UNKNOWN_SERVICE_NAME.to_string());
        let environment = attributes
            .first_text(&[
                semconv::DEPLOYMENT_ENVIRONMENT,
                semconv::DEPLOYMENT_ENVIRONMENT_NAME,
                semconv::ENVIRONMENT,
            ])
            .unwrap_or_else(|| UNKNOWN_ENVIRONMENT.to_string());

        Self {
            service_name,
            environment,
            labels: attributes.to_labels(nested_dropped),
        }
    }
}

/// Nanosecond timestamp field as wall time; absent, unparsable or zero is `None`.
fn timestamp_field(value: &JsonValue, name: FieldName) -> Option<DateTime<Utc>> {
    field(value, name)
        .and_then(lenient_u64)
        .and_then(nanos_to_datetime)
}

/// Normalize a trace or span identifier to lowercase hex.
///
/// Hex input is kept, base64 input (the binary decoder's byte rendering) is
/// re-encoded, and anything else passes through unchanged.
pub(crate) fn normalize_id(raw: &str) -> String {
    if raw.len() % 2 == 0 && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return raw.to_ascii_lowercase();
    }
    match BASE64_STANDARD.decode(raw) {
        Ok(bytes) if !bytes.is_empty() => hex::encode(bytes),
        _ => raw.to_string(),
    }
}

/// Normalized identifier stored under `name`, `None` when absent or empty.
fn id_field(value: &JsonValue, name: FieldName) -> Option<String> {
    field(value, name)
        .and_then(JsonValue::as_str)
        .filter(|raw| !raw.is_empty())
        .map(normalize_id)
}
