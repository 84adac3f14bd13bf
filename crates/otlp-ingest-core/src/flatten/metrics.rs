// Metric data point flattening
//
// Gauge, sum and histogram points become one record each. Exponential
// histograms and summaries have no single value to extract; their points are
// counted and skipped, as are metrics with no recognizable payload at all.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use super::{
    is_health_check_path, timestamp_field, walk, FlattenStats, Flattened, Flattener,
    ResourceContext, METRICS,
};
use crate::attributes::{AttributeMap, LabelValue, Labels};
use crate::field_names::otlp::{self, FieldName};
use crate::field_names::semconv;
use crate::json::{array, field, lenient_f64, string};
use crate::records::{MetricKind, MetricRecord};

/// Value fields in extraction priority.
const VALUE_FIELDS: [FieldName; 6] = [
    otlp::AS_DOUBLE,
    otlp::AS_INT,
    otlp::VALUE,
    otlp::SUM,
    otlp::COUNT,
    otlp::GAUGE,
];

pub(super) fn flatten(
    flattener: &Flattener,
    decoded: &JsonValue,
    received_at: DateTime<Utc>,
) -> Flattened<MetricRecord> {
    let filters = &flattener.config().health_check_path_filters;
    let mut records = Vec::new();
    let mut stats = FlattenStats::default();

    walk(decoded, &METRICS, &mut stats, |resource, metric, stats| {
        let Some((kind, data)) = payload(metric, stats) else {
            return;
        };
        let metric_name = string(metric, otlp::NAME).unwrap_or_default();
        let unit = string(metric, otlp::UNIT);

        for point in array(data, otlp::DATA_POINTS) {
            let labels = point_labels(resource, point, stats);
            if !filters.is_empty() && has_health_check_label(filters, &labels) {
                stats.filtered += 1;
                continue;
            }
            records.push(MetricRecord {
                timestamp: timestamp_field(point, otlp::TIME_UNIX_NANO).unwrap_or(received_at),
                service_name: resource.service_name.clone(),
                environment: resource.environment.clone(),
                metric_name: metric_name.clone(),
                metric_kind: kind,
                unit: unit.clone(),
                value: point_value(point),
                labels,
            });
        }
    });

    Flattened::new(records, stats)
}

/// The payload object of a metric and its kind, or `None` after counting a skip.
fn payload<'a>(
    metric: &'a JsonValue,
    stats: &mut FlattenStats,
) -> Option<(MetricKind, &'a JsonValue)> {
    let kinds = [
        (otlp::GAUGE, MetricKind::Gauge),
        (otlp::SUM, MetricKind::Sum),
        (otlp::HISTOGRAM, MetricKind::Histogram),
    ];
    if let Some(found) = kinds
        .into_iter()
        .find_map(|(name, kind)| field(metric, name).map(|data| (kind, data)))
    {
        return Some(found);
    }

    let skipped = &mut stats.skipped;
    if let Some(data) = field(metric, otlp::EXPONENTIAL_HISTOGRAM) {
        skipped.exponential_histograms += array(data, otlp::DATA_POINTS).len();
    } else if let Some(data) = field(metric, otlp::SUMMARY) {
        skipped.summaries += array(data, otlp::DATA_POINTS).len();
    } else {
        skipped.unknown_kinds += 1;
    }
    None
}

/// First field that holds a finite number, in `VALUE_FIELDS` order.
fn point_value(point: &JsonValue) -> Option<f64> {
    VALUE_FIELDS.iter().find_map(|name| {
        field(point, *name)
            .and_then(lenient_f64)
            .filter(|value| value.is_finite())
    })
}

/// Resource labels with the data point's labels applied on top.
fn point_labels(
    resource: &ResourceContext,
    point: &JsonValue,
    stats: &mut FlattenStats,
) -> Labels {
    let mut labels = resource.labels.clone();
    labels.extend(AttributeMap::of(point).to_labels(&mut stats.nested_attributes_dropped));
    labels
}

fn has_health_check_label(filters: &[String], labels: &Labels) -> bool {
    semconv::METRIC_PATH_LABELS.iter().any(|key| match labels.get(*key) {
        Some(LabelValue::String(path)) => is_health_check_path(filters, path),
        _ => false,
    })
}
