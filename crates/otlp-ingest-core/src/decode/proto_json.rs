//! Render decoded protobuf requests as OTLP JSON values.
//!
//! The output follows the protobuf JSON mapping so that binary and JSON
//! requests flow through the flattener identically:
//!
//! - field names are lowerCamelCase
//! - 64-bit integers (`fixed64`, `int64`, `uint64`) become decimal strings
//! - enums become their symbolic names; unknown values stay numeric
//! - byte fields become standard base64 strings
//! - default-valued scalars and empty lists are omitted
//!
//! The byte rendering is for inspection only; it is not meant to reproduce
//! the original message byte for byte.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use opentelemetry_proto::tonic::{
    collector::{
        metrics::v1::ExportMetricsServiceRequest, trace::v1::ExportTraceServiceRequest,
    },
    common::v1::{any_value, AnyValue, InstrumentationScope, KeyValue},
    metrics::v1::{
        exemplar, exponential_histogram_data_point::Buckets, metric::Data, number_data_point,
        AggregationTemporality, Exemplar, ExponentialHistogramDataPoint, HistogramDataPoint,
        Metric, NumberDataPoint, ResourceMetrics, ScopeMetrics, SummaryDataPoint,
    },
    resource::v1::Resource,
    trace::v1::{span, status, ResourceSpans, ScopeSpans, Span, Status},
};
use serde_json::{Map, Value as JsonValue};

use crate::field_names::otlp::{self, FieldName};

/// Render an `ExportTraceServiceRequest` in OTLP JSON shape.
pub fn trace_request_to_json(request: &ExportTraceServiceRequest) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.list(
        otlp::RESOURCE_SPANS,
        request.resource_spans.iter().map(resource_spans_to_json),
    );
    obj.finish()
}

/// Render an `ExportMetricsServiceRequest` in OTLP JSON shape.
pub fn metrics_request_to_json(request: &ExportMetricsServiceRequest) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.list(
        otlp::RESOURCE_METRICS,
        request.resource_metrics.iter().map(resource_metrics_to_json),
    );
    obj.finish()
}

/// Object builder that drops default values, mirroring proto3 JSON output.
struct JsonObject(Map<String, JsonValue>);

impl JsonObject {
    fn new() -> Self {
        Self(Map::new())
    }

    fn put(&mut self, name: FieldName, value: JsonValue) {
        self.0.insert(name.0.to_string(), value);
    }

    fn string(&mut self, name: FieldName, value: &str) {
        if !value.is_empty() {
            self.put(name, JsonValue::String(value.to_string()));
        }
    }

    fn bytes(&mut self, name: FieldName, value: &[u8]) {
        if !value.is_empty() {
            self.put(name, JsonValue::String(BASE64_STANDARD.encode(value)));
        }
    }

    fn long(&mut self, name: FieldName, value: u64) {
        if value != 0 {
            self.put(name, long_value(value));
        }
    }

    fn uint(&mut self, name: FieldName, value: u32) {
        if value != 0 {
            self.put(name, JsonValue::from(value));
        }
    }

    fn int(&mut self, name: FieldName, value: i32) {
        if value != 0 {
            self.put(name, JsonValue::from(value));
        }
    }

    fn double(&mut self, name: FieldName, value: f64) {
        if value != 0.0 {
            self.put(name, double_value(value));
        }
    }

    fn optional_double(&mut self, name: FieldName, value: Option<f64>) {
        if let Some(value) = value {
            self.put(name, double_value(value));
        }
    }

    fn boolean(&mut self, name: FieldName, value: bool) {
        if value {
            self.put(name, JsonValue::Bool(true));
        }
    }

    fn enumeration(&mut self, name: FieldName, value: i32, symbol: Option<&'static str>) {
        if value == 0 {
            return;
        }
        let rendered = match symbol {
            Some(symbol) => JsonValue::String(symbol.to_string()),
            None => JsonValue::from(value),
        };
        self.put(name, rendered);
    }

    fn object(&mut self, name: FieldName, value: Option<JsonValue>) {
        if let Some(value) = value {
            self.put(name, value);
        }
    }

    fn list<I>(&mut self, name: FieldName, items: I)
    where
        I: IntoIterator<Item = JsonValue>,
    {
        let items: Vec<JsonValue> = items.into_iter().collect();
        if !items.is_empty() {
            self.put(name, JsonValue::Array(items));
        }
    }

    fn attributes(&mut self, name: FieldName, attributes: &[KeyValue]) {
        self.list(name, attributes.iter().map(key_value_to_json));
    }

    fn finish(self) -> JsonValue {
        JsonValue::Object(self.0)
    }
}

fn long_value(value: u64) -> JsonValue {
    JsonValue::String(value.to_string())
}

/// Non-finite doubles use the proto3 JSON string spellings.
fn double_value(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or_else(|| {
            let spelled = if value.is_nan() {
                "NaN"
            } else if value.is_sign_positive() {
                "Infinity"
            } else {
                "-Infinity"
            };
            JsonValue::String(spelled.to_string())
        })
}

// Common messages

fn key_value_to_json(kv: &KeyValue) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.put(otlp::KEY, JsonValue::String(kv.key.clone()));
    obj.object(otlp::VALUE, kv.value.as_ref().map(any_value_to_json));
    obj.finish()
}

fn any_value_to_json(value: &AnyValue) -> JsonValue {
    let mut obj = JsonObject::new();
    // The populated oneof member is always rendered, even when it holds a
    // default value.
    match &value.value {
        Some(any_value::Value::StringValue(s)) => {
            obj.put(otlp::STRING_VALUE, JsonValue::String(s.clone()))
        }
        Some(any_value::Value::BoolValue(b)) => obj.put(otlp::BOOL_VALUE, JsonValue::Bool(*b)),
        Some(any_value::Value::IntValue(i)) => {
            obj.put(otlp::INT_VALUE, JsonValue::String(i.to_string()))
        }
        Some(any_value::Value::DoubleValue(d)) => obj.put(otlp::DOUBLE_VALUE, double_value(*d)),
        Some(any_value::Value::BytesValue(bytes)) => obj.put(
            otlp::BYTES_VALUE,
            JsonValue::String(BASE64_STANDARD.encode(bytes)),
        ),
        Some(any_value::Value::ArrayValue(array)) => {
            let mut inner = JsonObject::new();
            inner.list(otlp::VALUES, array.values.iter().map(any_value_to_json));
            obj.put(otlp::ARRAY_VALUE, inner.finish());
        }
        Some(any_value::Value::KvlistValue(kvlist)) => {
            let mut inner = JsonObject::new();
            inner.attributes(otlp::VALUES, &kvlist.values);
            obj.put(otlp::KVLIST_VALUE, inner.finish());
        }
        None => {}
    }
    obj.finish()
}

fn resource_to_json(resource: &Resource) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.attributes(otlp::ATTRIBUTES, &resource.attributes);
    obj.uint(
        otlp::DROPPED_ATTRIBUTES_COUNT,
        resource.dropped_attributes_count,
    );
    obj.finish()
}

fn scope_to_json(scope: &InstrumentationScope) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.string(otlp::NAME, &scope.name);
    obj.string(otlp::VERSION, &scope.version);
    obj.attributes(otlp::ATTRIBUTES, &scope.attributes);
    obj.uint(otlp::DROPPED_ATTRIBUTES_COUNT, scope.dropped_attributes_count);
    obj.finish()
}

// Traces

fn resource_spans_to_json(resource_spans: &ResourceSpans) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.object(
        otlp::RESOURCE,
        resource_spans.resource.as_ref().map(resource_to_json),
    );
    obj.list(
        otlp::SCOPE_SPANS,
        resource_spans.scope_spans.iter().map(scope_spans_to_json),
    );
    obj.string(otlp::SCHEMA_URL, &resource_spans.schema_url);
    obj.finish()
}

fn scope_spans_to_json(scope_spans: &ScopeSpans) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.object(otlp::SCOPE, scope_spans.scope.as_ref().map(scope_to_json));
    obj.list(otlp::SPANS, scope_spans.spans.iter().map(span_to_json));
    obj.string(otlp::SCHEMA_URL, &scope_spans.schema_url);
    obj.finish()
}

fn span_to_json(span: &Span) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.bytes(otlp::TRACE_ID, &span.trace_id);
    obj.bytes(otlp::SPAN_ID, &span.span_id);
    obj.string(otlp::TRACE_STATE, &span.trace_state);
    obj.bytes(otlp::PARENT_SPAN_ID, &span.parent_span_id);
    obj.uint(otlp::FLAGS, span.flags);
    obj.string(otlp::NAME, &span.name);
    obj.enumeration(
        otlp::KIND,
        span.kind,
        span::SpanKind::try_from(span.kind)
            .ok()
            .map(|kind| kind.as_str_name()),
    );
    obj.long(otlp::START_TIME_UNIX_NANO, span.start_time_unix_nano);
    obj.long(otlp::END_TIME_UNIX_NANO, span.end_time_unix_nano);
    obj.attributes(otlp::ATTRIBUTES, &span.attributes);
    obj.uint(otlp::DROPPED_ATTRIBUTES_COUNT, span.dropped_attributes_count);
    obj.list(otlp::EVENTS, span.events.iter().map(event_to_json));
    obj.uint(otlp::DROPPED_EVENTS_COUNT, span.dropped_events_count);
    obj.list(otlp::LINKS, span.links.iter().map(link_to_json));
    obj.uint(otlp::DROPPED_LINKS_COUNT, span.dropped_links_count);
    obj.object(otlp::STATUS, span.status.as_ref().map(status_to_json));
    obj.finish()
}

fn event_to_json(event: &span::Event) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.long(otlp::TIME_UNIX_NANO, event.time_unix_nano);
    obj.string(otlp::NAME, &event.name);
    obj.attributes(otlp::ATTRIBUTES, &event.attributes);
    obj.uint(otlp::DROPPED_ATTRIBUTES_COUNT, event.dropped_attributes_count);
    obj.finish()
}

fn link_to_json(link: &span::Link) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.bytes(otlp::TRACE_ID, &link.trace_id);
    obj.bytes(otlp::SPAN_ID, &link.span_id);
    obj.string(otlp::TRACE_STATE, &link.trace_state);
    obj.attributes(otlp::ATTRIBUTES, &link.attributes);
    obj.uint(otlp::DROPPED_ATTRIBUTES_COUNT, link.dropped_attributes_count);
    obj.uint(otlp::FLAGS, link.flags);
    obj.finish()
}

fn status_to_json(status: &Status) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.string(otlp::MESSAGE, &status.message);
    obj.enumeration(
        otlp::CODE,
        status.code,
        status::StatusCode::try_from(status.code)
            .ok()
            .map(|code| code.as_str_name()),
    );
    obj.finish()
}

// Metrics

fn resource_metrics_to_json(resource_metrics: &ResourceMetrics) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.object(
        otlp::RESOURCE,
        resource_metrics.resource.as_ref().map(resource_to_json),
    );
    obj.list(
        otlp::SCOPE_METRICS,
        resource_metrics.scope_metrics.iter().map(scope_metrics_to_json),
    );
    obj.string(otlp::SCHEMA_URL, &resource_metrics.schema_url);
    obj.finish()
}

fn scope_metrics_to_json(scope_metrics: &ScopeMetrics) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.object(otlp::SCOPE, scope_metrics.scope.as_ref().map(scope_to_json));
    obj.list(otlp::METRICS, scope_metrics.metrics.iter().map(metric_to_json));
    obj.string(otlp::SCHEMA_URL, &scope_metrics.schema_url);
    obj.finish()
}

fn temporality(value: i32) -> Option<&'static str> {
    AggregationTemporality::try_from(value)
        .ok()
        .map(|temporality| temporality.as_str_name())
}

fn metric_to_json(metric: &Metric) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.string(otlp::NAME, &metric.name);
    obj.string(otlp::DESCRIPTION, &metric.description);
    obj.string(otlp::UNIT, &metric.unit);

    match &metric.data {
        Some(Data::Gauge(gauge)) => {
            let mut inner = JsonObject::new();
            inner.list(
                otlp::DATA_POINTS,
                gauge.data_points.iter().map(number_point_to_json),
            );
            obj.put(otlp::GAUGE, inner.finish());
        }
        Some(Data::Sum(sum)) => {
            let mut inner = JsonObject::new();
            inner.list(
                otlp::DATA_POINTS,
                sum.data_points.iter().map(number_point_to_json),
            );
            inner.enumeration(
                otlp::AGGREGATION_TEMPORALITY,
                sum.aggregation_temporality,
                temporality(sum.aggregation_temporality),
            );
            inner.boolean(otlp::IS_MONOTONIC, sum.is_monotonic);
            obj.put(otlp::SUM, inner.finish());
        }
        Some(Data::Histogram(histogram)) => {
            let mut inner = JsonObject::new();
            inner.list(
                otlp::DATA_POINTS,
                histogram.data_points.iter().map(histogram_point_to_json),
            );
            inner.enumeration(
                otlp::AGGREGATION_TEMPORALITY,
                histogram.aggregation_temporality,
                temporality(histogram.aggregation_temporality),
            );
            obj.put(otlp::HISTOGRAM, inner.finish());
        }
        Some(Data::ExponentialHistogram(histogram)) => {
            let mut inner = JsonObject::new();
            inner.list(
                otlp::DATA_POINTS,
                histogram
                    .data_points
                    .iter()
                    .map(exponential_histogram_point_to_json),
            );
            inner.enumeration(
                otlp::AGGREGATION_TEMPORALITY,
                histogram.aggregation_temporality,
                temporality(histogram.aggregation_temporality),
            );
            obj.put(otlp::EXPONENTIAL_HISTOGRAM, inner.finish());
        }
        Some(Data::Summary(summary)) => {
            let mut inner = JsonObject::new();
            inner.list(
                otlp::DATA_POINTS,
                summary.data_points.iter().map(summary_point_to_json),
            );
            obj.put(otlp::SUMMARY, inner.finish());
        }
        None => {}
    }

    obj.finish()
}

fn number_point_to_json(point: &NumberDataPoint) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.attributes(otlp::ATTRIBUTES, &point.attributes);
    obj.long(otlp::START_TIME_UNIX_NANO, point.start_time_unix_nano);
    obj.long(otlp::TIME_UNIX_NANO, point.time_unix_nano);
    match point.value {
        Some(number_data_point::Value::AsDouble(v)) => obj.put(otlp::AS_DOUBLE, double_value(v)),
        Some(number_data_point::Value::AsInt(v)) => {
            obj.put(otlp::AS_INT, JsonValue::String(v.to_string()))
        }
        None => {}
    }
    obj.list(otlp::EXEMPLARS, point.exemplars.iter().map(exemplar_to_json));
    obj.uint(otlp::FLAGS, point.flags);
    obj.finish()
}

fn histogram_point_to_json(point: &HistogramDataPoint) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.attributes(otlp::ATTRIBUTES, &point.attributes);
    obj.long(otlp::START_TIME_UNIX_NANO, point.start_time_unix_nano);
    obj.long(otlp::TIME_UNIX_NANO, point.time_unix_nano);
    obj.long(otlp::COUNT, point.count);
    obj.optional_double(otlp::SUM, point.sum);
    obj.list(
        otlp::BUCKET_COUNTS,
        point.bucket_counts.iter().copied().map(long_value),
    );
    obj.list(
        otlp::EXPLICIT_BOUNDS,
        point.explicit_bounds.iter().copied().map(double_value),
    );
    obj.list(otlp::EXEMPLARS, point.exemplars.iter().map(exemplar_to_json));
    obj.uint(otlp::FLAGS, point.flags);
    obj.optional_double(otlp::MIN, point.min);
    obj.optional_double(otlp::MAX, point.max);
    obj.finish()
}

fn exponential_histogram_point_to_json(point: &ExponentialHistogramDataPoint) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.attributes(otlp::ATTRIBUTES, &point.attributes);
    obj.long(otlp::START_TIME_UNIX_NANO, point.start_time_unix_nano);
    obj.long(otlp::TIME_UNIX_NANO, point.time_unix_nano);
    obj.long(otlp::COUNT, point.count);
    obj.optional_double(otlp::SUM, point.sum);
    obj.int(otlp::SCALE, point.scale);
    obj.long(otlp::ZERO_COUNT, point.zero_count);
    obj.object(otlp::POSITIVE, point.positive.as_ref().map(buckets_to_json));
    obj.object(otlp::NEGATIVE, point.negative.as_ref().map(buckets_to_json));
    obj.uint(otlp::FLAGS, point.flags);
    obj.list(otlp::EXEMPLARS, point.exemplars.iter().map(exemplar_to_json));
    obj.optional_double(otlp::MIN, point.min);
    obj.optional_double(otlp::MAX, point.max);
    obj.double(otlp::ZERO_THRESHOLD, point.zero_threshold);
    obj.finish()
}

fn buckets_to_json(buckets: &Buckets) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.int(otlp::OFFSET, buckets.offset);
    obj.list(
        otlp::BUCKET_COUNTS,
        buckets.bucket_counts.iter().copied().map(long_value),
    );
    obj.finish()
}

fn summary_point_to_json(point: &SummaryDataPoint) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.attributes(otlp::ATTRIBUTES, &point.attributes);
    obj.long(otlp::START_TIME_UNIX_NANO, point.start_time_unix_nano);
    obj.long(otlp::TIME_UNIX_NANO, point.time_unix_nano);
    obj.long(otlp::COUNT, point.count);
    obj.double(otlp::SUM, point.sum);
    obj.list(
        otlp::QUANTILE_VALUES,
        point.quantile_values.iter().map(|quantile| {
            let mut inner = JsonObject::new();
            inner.double(otlp::QUANTILE, quantile.quantile);
            inner.double(otlp::VALUE, quantile.value);
            inner.finish()
        }),
    );
    obj.uint(otlp::FLAGS, point.flags);
    obj.finish()
}

fn exemplar_to_json(exemplar: &Exemplar) -> JsonValue {
    let mut obj = JsonObject::new();
    obj.attributes(otlp::FILTERED_ATTRIBUTES, &exemplar.filtered_attributes);
    obj.long(otlp::TIME_UNIX_NANO, exemplar.time_unix_nano);
    match exemplar.value {
        Some(exemplar::Value::AsDouble(v)) => obj.put(otlp::AS_DOUBLE, double_value(v)),
        Some(exemplar::Value::AsInt(v)) => obj.put(otlp::AS_INT, JsonValue::String(v.to_string())),
        None => {}
    }
    obj.bytes(otlp::SPAN_ID, &exemplar.span_id);
    obj.bytes(otlp::TRACE_ID, &exemplar.trace_id);
    obj.finish()
}
