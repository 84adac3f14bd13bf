// Span flattening

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use super::{
    id_field, timestamp_field, walk, FlattenStats, Flattened, Flattener, ResourceContext, TRACES,
};
use crate::attributes::{AttributeMap, AttributeValue};
use crate::field_names::{otlp, semconv};
use crate::json::{field, lenient_i64, lenient_u64, string};
use crate::records::{SpanKind, SpanRecord, SpanStatus};

const NANOS_PER_MILLI: f64 = 1_000_000.0;

pub(super) fn flatten(
    flattener: &Flattener,
    decoded: &JsonValue,
    received_at: DateTime<Utc>,
) -> Flattened<SpanRecord> {
    let mut records = Vec::new();
    let mut stats = FlattenStats::default();

    walk(decoded, &TRACES, &mut stats, |resource, span, stats| {
        let record = span_record(resource, span, received_at, stats);
        if record
            .http_path
            .as_deref()
            .is_some_and(|path| flattener.is_health_check(path))
        {
            stats.filtered += 1;
            return;
        }
        records.push(record);
    });

    Flattened::new(records, stats)
}

fn span_record(
    resource: &ResourceContext,
    span: &JsonValue,
    received_at: DateTime<Utc>,
    stats: &mut FlattenStats,
) -> SpanRecord {
    let attributes = AttributeMap::of(span);
    let mut consumed = Vec::new();

    let http_method = lift(
        &attributes,
        semconv::HTTP_METHOD_KEYS,
        AttributeValue::to_non_empty_text,
        &mut consumed,
    );
    let http_path = lift(
        &attributes,
        semconv::HTTP_PATH_KEYS,
        AttributeValue::to_non_empty_text,
        &mut consumed,
    );
    let http_status_code = lift(
        &attributes,
        semconv::HTTP_STATUS_CODE_KEYS,
        AttributeValue::to_i64,
        &mut consumed,
    );

    let mut labels = attributes.to_labels(&mut stats.nested_attributes_dropped);
    for key in consumed {
        labels.remove(key);
    }

    let start = timestamp_field(span, otlp::START_TIME_UNIX_NANO);
    let status = field(span, otlp::STATUS);

    SpanRecord {
        timestamp: start.unwrap_or(received_at),
        service_name: resource.service_name.clone(),
        environment: resource.environment.clone(),
        trace_id: id_field(span, otlp::TRACE_ID).unwrap_or_default(),
        span_id: id_field(span, otlp::SPAN_ID).unwrap_or_default(),
        parent_span_id: id_field(span, otlp::PARENT_SPAN_ID),
        name: string(span, otlp::NAME).unwrap_or_default(),
        duration_ms: duration_ms(span),
        status: status.map(span_status).unwrap_or(SpanStatus::Unset),
        status_message: status.and_then(|status| string(status, otlp::MESSAGE)),
        kind: field(span, otlp::KIND)
            .map(span_kind)
            .unwrap_or(SpanKind::Unspecified),
        http_method,
        http_path,
        http_status_code,
        labels,
    }
}

/// Take the first convertible value among `keys`, remembering which key supplied it.
///
/// Only that key leaves the labels; lower-priority aliases stay as ordinary labels.
fn lift<T>(
    attributes: &AttributeMap,
    keys: &[&'static str],
    convert: fn(&AttributeValue) -> Option<T>,
    consumed: &mut Vec<&'static str>,
) -> Option<T> {
    let (key, value) = attributes.first_converted(keys, convert)?;
    consumed.push(key);
    Some(value)
}

/// `(end − start)` in milliseconds; 0 unless both ends parse and end ≥ start.
fn duration_ms(span: &JsonValue) -> f64 {
    let nanos = |name| field(span, name).and_then(lenient_u64);
    match (
        nanos(otlp::START_TIME_UNIX_NANO),
        nanos(otlp::END_TIME_UNIX_NANO),
    ) {
        (Some(start), Some(end)) if end > start => (end - start) as f64 / NANOS_PER_MILLI,
        _ => 0.0,
    }
}

fn span_status(status: &JsonValue) -> SpanStatus {
    match field(status, otlp::CODE) {
        Some(JsonValue::String(name)) => SpanStatus::from_name(name),
        Some(code) => lenient_i64(code)
            .map(SpanStatus::from_code)
            .unwrap_or(SpanStatus::Unset),
        None => SpanStatus::Unset,
    }
}

fn span_kind(kind: &JsonValue) -> SpanKind {
    match kind {
        JsonValue::String(name) => SpanKind::from_name(name),
        other => lenient_i64(other)
            .map(SpanKind::from_code)
            .unwrap_or(SpanKind::Unspecified),
    }
}
