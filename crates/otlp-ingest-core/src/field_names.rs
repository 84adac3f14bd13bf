//! Field name constants for OTLP JSON payloads and flat records.
//!
//! Two naming conventions meet in this crate:
//!
//! - **OTLP JSON fields** (lowerCamelCase): the canonical protobuf JSON
//!   mapping, which is also what the binary decoder renders. Producers that
//!   serialize with the original proto field names send snake_case instead,
//!   so every lookup goes through a `(camel, snake)` pair.
//! - **Semantic convention keys** (dot notation): attribute keys with a
//!   well-known meaning that the flattener lifts into dedicated fields.
//!
//! Reference: https://opentelemetry.io/docs/specs/otlp/#json-protobuf-encoding

/// OTLP JSON field names as `(lowerCamelCase, snake_case)` pairs.
pub mod otlp {
    /// A JSON field that may be spelled in either casing.
    pub type FieldName = (&'static str, &'static str);

    // Envelope containers
    pub const RESOURCE_SPANS: FieldName = ("resourceSpans", "resource_spans");
    pub const RESOURCE_METRICS: FieldName = ("resourceMetrics", "resource_metrics");
    pub const RESOURCE_LOGS: FieldName = ("resourceLogs", "resource_logs");
    pub const SCOPE_SPANS: FieldName = ("scopeSpans", "scope_spans");
    pub const SCOPE_METRICS: FieldName = ("scopeMetrics", "scope_metrics");
    pub const SCOPE_LOGS: FieldName = ("scopeLogs", "scope_logs");
    /// Pre-1.0 name of `scopeSpans`, still emitted by old SDKs.
    pub const INSTRUMENTATION_LIBRARY_SPANS: FieldName =
        ("instrumentationLibrarySpans", "instrumentation_library_spans");
    pub const INSTRUMENTATION_LIBRARY_METRICS: FieldName = (
        "instrumentationLibraryMetrics",
        "instrumentation_library_metrics",
    );
    pub const INSTRUMENTATION_LIBRARY_LOGS: FieldName =
        ("instrumentationLibraryLogs", "instrumentation_library_logs");
    pub const SPANS: FieldName = ("spans", "spans");
    pub const METRICS: FieldName = ("metrics", "metrics");
    pub const LOG_RECORDS: FieldName = ("logRecords", "log_records");
    pub const RESOURCE: FieldName = ("resource", "resource");
    pub const SCOPE: FieldName = ("scope", "scope");
    pub const SCHEMA_URL: FieldName = ("schemaUrl", "schema_url");

    // Shared fields
    pub const ATTRIBUTES: FieldName = ("attributes", "attributes");
    pub const DROPPED_ATTRIBUTES_COUNT: FieldName =
        ("droppedAttributesCount", "dropped_attributes_count");
    pub const KEY: FieldName = ("key", "key");
    pub const VALUE: FieldName = ("value", "value");
    pub const NAME: FieldName = ("name", "name");
    pub const VERSION: FieldName = ("version", "version");

    // AnyValue variants, in flattening priority order
    pub const STRING_VALUE: FieldName = ("stringValue", "string_value");
    pub const DOUBLE_VALUE: FieldName = ("doubleValue", "double_value");
    pub const INT_VALUE: FieldName = ("intValue", "int_value");
    pub const BOOL_VALUE: FieldName = ("boolValue", "bool_value");
    pub const BYTES_VALUE: FieldName = ("bytesValue", "bytes_value");
    pub const ARRAY_VALUE: FieldName = ("arrayValue", "array_value");
    pub const KVLIST_VALUE: FieldName = ("kvlistValue", "kvlist_value");
    pub const VALUES: FieldName = ("values", "values");

    // Span fields
    pub const TRACE_ID: FieldName = ("traceId", "trace_id");
    pub const SPAN_ID: FieldName = ("spanId", "span_id");
    pub const PARENT_SPAN_ID: FieldName = ("parentSpanId", "parent_span_id");
    pub const TRACE_STATE: FieldName = ("traceState", "trace_state");
    pub const FLAGS: FieldName = ("flags", "flags");
    pub const KIND: FieldName = ("kind", "kind");
    pub const START_TIME_UNIX_NANO: FieldName = ("startTimeUnixNano", "start_time_unix_nano");
    pub const END_TIME_UNIX_NANO: FieldName = ("endTimeUnixNano", "end_time_unix_nano");
    pub const STATUS: FieldName = ("status", "status");
    pub const CODE: FieldName = ("code", "code");
    pub const MESSAGE: FieldName = ("message", "message");
    pub const EVENTS: FieldName = ("events", "events");
    pub const LINKS: FieldName = ("links", "links");
    pub const DROPPED_EVENTS_COUNT: FieldName = ("droppedEventsCount", "dropped_events_count");
    pub const DROPPED_LINKS_COUNT: FieldName = ("droppedLinksCount", "dropped_links_count");

    // Metric fields
    pub const DESCRIPTION: FieldName = ("description", "description");
    pub const UNIT: FieldName = ("unit", "unit");
    pub const GAUGE: FieldName = ("gauge", "gauge");
    pub const SUM: FieldName = ("sum", "sum");
    pub const HISTOGRAM: FieldName = ("histogram", "histogram");
    pub const EXPONENTIAL_HISTOGRAM: FieldName =
        ("exponentialHistogram", "exponential_histogram");
    pub const SUMMARY: FieldName = ("summary", "summary");
    pub const DATA_POINTS: FieldName = ("dataPoints", "data_points");
    pub const TIME_UNIX_NANO: FieldName = ("timeUnixNano", "time_unix_nano");
    pub const AGGREGATION_TEMPORALITY: FieldName =
        ("aggregationTemporality", "aggregation_temporality");
    pub const IS_MONOTONIC: FieldName = ("isMonotonic", "is_monotonic");
    pub const AS_DOUBLE: FieldName = ("asDouble", "as_double");
    pub const AS_INT: FieldName = ("asInt", "as_int");
    pub const COUNT: FieldName = ("count", "count");
    pub const BUCKET_COUNTS: FieldName = ("bucketCounts", "bucket_counts");
    pub const EXPLICIT_BOUNDS: FieldName = ("explicitBounds", "explicit_bounds");
    pub const MIN: FieldName = ("min", "min");
    pub const MAX: FieldName = ("max", "max");
    pub const EXEMPLARS: FieldName = ("exemplars", "exemplars");
    pub const FILTERED_ATTRIBUTES: FieldName = ("filteredAttributes", "filtered_attributes");
    pub const SCALE: FieldName = ("scale", "scale");
    pub const ZERO_COUNT: FieldName = ("zeroCount", "zero_count");
    pub const ZERO_THRESHOLD: FieldName = ("zeroThreshold", "zero_threshold");
    pub const POSITIVE: FieldName = ("positive", "positive");
    pub const NEGATIVE: FieldName = ("negative", "negative");
    pub const OFFSET: FieldName = ("offset", "offset");
    pub const QUANTILE_VALUES: FieldName = ("quantileValues", "quantile_values");
    pub const QUANTILE: FieldName = ("quantile", "quantile");

    // Log record fields
    pub const OBSERVED_TIME_UNIX_NANO: FieldName =
        ("observedTimeUnixNano", "observed_time_unix_nano");
    pub const SEVERITY_NUMBER: FieldName = ("severityNumber", "severity_number");
    pub const SEVERITY_TEXT: FieldName = ("severityText", "severity_text");
    pub const BODY: FieldName = ("body", "body");
    pub const EVENT_NAME: FieldName = ("eventName", "event_name");
}

/// OpenTelemetry semantic conventions the flattener recognizes.
///
/// Reference: https://opentelemetry.io/docs/specs/semconv/
pub mod semconv {
    /// Logical name of the service (e.g., "checkout")
    pub const SERVICE_NAME: &str = "service.name";
    /// Hostname, used when `service.name` is absent
    pub const HOST_NAME: &str = "host.name";
    /// Deployment environment (e.g., "prod")
    pub const DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment";
    /// Newer spelling of the deployment environment
    pub const DEPLOYMENT_ENVIRONMENT_NAME: &str = "deployment.environment.name";
    /// Non-standard environment key some SDK configurations use
    pub const ENVIRONMENT: &str = "environment";

    /// HTTP method keys, legacy first
    pub const HTTP_METHOD_KEYS: &[&str] = &["http.method", "http.request.method"];
    /// HTTP path keys in lookup priority
    pub const HTTP_PATH_KEYS: &[&str] = &["http.target", "http.route", "http.url", "http.path"];
    /// HTTP response status keys, legacy first
    pub const HTTP_STATUS_CODE_KEYS: &[&str] = &["http.status_code", "http.response.status_code"];

    /// Metric labels that carry a request path (checked by health-check filtering)
    pub const METRIC_PATH_LABELS: &[&str] = &["http.route", "http.target", "http_path"];

    // Log record attributes. Structured loggers that export through OTLP
    // often keep their flat field names, so those are accepted after the
    // semantic convention keys.
    pub const LOG_TYPE_KEYS: &[&str] = &["log.type", "type"];
    pub const LOG_CONTEXT_KEYS: &[&str] = &["code.namespace", "context"];
    pub const LOG_HTTP_METHOD_KEYS: &[&str] = &["http.method", "http.request.method", "http_method"];
    pub const LOG_HTTP_PATH_KEYS: &[&str] =
        &["http.target", "http.route", "http.url", "http.path", "http_path"];
    pub const LOG_HTTP_STATUS_CODE_KEYS: &[&str] = &[
        "http.status_code",
        "http.response.status_code",
        "http_status_code",
    ];
    pub const LOG_DURATION_MS_KEYS: &[&str] = &["duration_ms"];
    pub const LOG_CLIENT_IP_KEYS: &[&str] = &["client.address", "net.peer.ip", "client_ip"];
    pub const LOG_STACK_KEYS: &[&str] = &["exception.stacktrace", "stack"];
}

/// Field names of the shipped structured-log format (Fluent Bit batches).
pub mod shipped {
    pub const TYPE: &str = "type";
    /// Timestamp fields in lookup priority
    pub const TIMESTAMP_KEYS: &[&str] = &["timestamp", "@timestamp", "time", "date"];
    pub const SERVICE_NAME_KEYS: &[&str] = &["service_name", "service"];
    pub const ENVIRONMENT: &str = "environment";
    pub const LEVEL: &str = "level";
    pub const MESSAGE: &str = "message";
    pub const TRACE_ID: &str = "trace_id";
    pub const SPAN_ID: &str = "span_id";
    pub const CONTEXT: &str = "context";
    pub const HTTP_METHOD: &str = "http_method";
    pub const HTTP_PATH: &str = "http_path";
    pub const HTTP_STATUS_CODE: &str = "http_status_code";
    pub const DURATION_MS: &str = "duration_ms";
    pub const CLIENT_IP: &str = "client_ip";
    pub const STACK: &str = "stack";
}
