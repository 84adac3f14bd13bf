// Synthetic OTLP data generators for benchmarking
//
// Creates realistic export requests with configurable:
// - Number of spans / data points (1k, 50k)
// - Format (protobuf, JSON)

use opentelemetry_proto::tonic::{
    collector::{
        metrics::v1::ExportMetricsServiceRequest, trace::v1::ExportTraceServiceRequest,
    },
    common::v1::{any_value, AnyValue, InstrumentationScope, KeyValue},
    metrics::v1::{
        metric::Data, number_data_point, Gauge, Metric, NumberDataPoint, ResourceMetrics,
        ScopeMetrics,
    },
    resource::v1::Resource,
    trace::v1::{span, status, ResourceSpans, ScopeSpans, Span, Status},
};
use otlp_ingest_core::decode::{metrics_request_to_json, trace_request_to_json};
use prost::Message;

const BASE_TIMESTAMP_NANOS: u64 = 1_705_327_800_000_000_000;

/// Workload size presets
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum WorkloadSize {
    Small,  // 1k items
    Medium, // 50k items
}

impl WorkloadSize {
    pub fn item_count(&self) -> usize {
        match self {
            WorkloadSize::Small => 1_000,
            WorkloadSize::Medium => 50_000,
        }
    }
}

fn resource(resource_idx: usize) -> Option<Resource> {
    Some(Resource {
        attributes: vec![
            key_value("service.name", &format!("bench-service-{}", resource_idx % 10)),
            key_value("service.instance.id", &format!("instance-{}", resource_idx)),
            key_value("host.name", &format!("host-{}", resource_idx % 20)),
            key_value("deployment.environment", "benchmark"),
        ],
        ..Default::default()
    })
}

fn scope() -> Option<InstrumentationScope> {
    Some(InstrumentationScope {
        name: "benchmark".to_string(),
        version: "1.0.0".to_string(),
        ..Default::default()
    })
}

/// Generate a synthetic trace export request
pub fn generate_traces(size: WorkloadSize) -> ExportTraceServiceRequest {
    let span_count = size.item_count();
    let num_resources = (span_count / 1000).clamp(1, 50);
    let spans_per_resource = span_count / num_resources;

    let resource_spans = (0..num_resources)
        .map(|resource_idx| ResourceSpans {
            resource: resource(resource_idx),
            scope_spans: vec![ScopeSpans {
                scope: scope(),
                spans: (0..spans_per_resource)
                    .map(|span_idx| generate_span(resource_idx * spans_per_resource + span_idx))
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        })
        .collect();

    ExportTraceServiceRequest { resource_spans }
}

fn generate_span(idx: usize) -> Span {
    let start = BASE_TIMESTAMP_NANOS + idx as u64 * 1_000_000;
    let (method, status_code) = match idx % 4 {
        0 => ("GET", 200),
        1 => ("POST", 201),
        2 => ("GET", 404),
        _ => ("PUT", 500),
    };

    Span {
        trace_id: generate_trace_id(idx / 10),
        span_id: (idx as u64 + 1).to_be_bytes().to_vec(),
        parent_span_id: if idx % 10 == 0 {
            Vec::new()
        } else {
            ((idx - idx % 10) as u64 + 1).to_be_bytes().to_vec()
        },
        name: format!("{} /api/items/{}", method, idx % 100),
        kind: span::SpanKind::Server as i32,
        start_time_unix_nano: start,
        end_time_unix_nano: start + (idx as u64 % 50 + 1) * 1_000_000,
        attributes: vec![
            key_value("http.method", method),
            key_value("http.route", "/api/items/:id"),
            key_value_int("http.status_code", status_code),
            key_value("user.tier", if idx % 3 == 0 { "gold" } else { "free" }),
        ],
        status: Some(Status {
            message: String::new(),
            code: if status_code >= 500 {
                status::StatusCode::Error as i32
            } else {
                status::StatusCode::Ok as i32
            },
        }),
        ..Default::default()
    }
}

/// Generate a synthetic gauge export request
pub fn generate_metrics(size: WorkloadSize) -> ExportMetricsServiceRequest {
    let point_count = size.item_count();
    let num_resources = (point_count / 1000).clamp(1, 50);
    let points_per_resource = point_count / num_resources;

    let resource_metrics = (0..num_resources)
        .map(|resource_idx| ResourceMetrics {
            resource: resource(resource_idx),
            scope_metrics: vec![ScopeMetrics {
                scope: scope(),
                metrics: vec![Metric {
                    name: "process.cpu.utilization".to_string(),
                    unit: "1".to_string(),
                    data: Some(Data::Gauge(Gauge {
                        data_points: (0..points_per_resource)
                            .map(|point_idx| NumberDataPoint {
                                time_unix_nano: BASE_TIMESTAMP_NANOS + point_idx as u64,
                                value: Some(number_data_point::Value::AsDouble(
                                    (point_idx % 100) as f64 / 100.0,
                                )),
                                attributes: vec![key_value("cpu", &(point_idx % 8).to_string())],
                                ..Default::default()
                            })
                            .collect(),
                    })),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        })
        .collect();

    ExportMetricsServiceRequest { resource_metrics }
}

/// Helper to create a string KeyValue
fn key_value(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::StringValue(value.to_string())),
        }),
    }
}

/// Helper to create an integer KeyValue
fn key_value_int(key: &str, value: i64) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::IntValue(value)),
        }),
    }
}

/// Generate a realistic 16-byte trace ID
fn generate_trace_id(idx: usize) -> Vec<u8> {
    let mut trace_id = vec![0u8; 16];
    trace_id[0] = 0x5b;
    trace_id[8..].copy_from_slice(&(idx as u64).to_be_bytes());
    trace_id
}

/// Serialize request to protobuf bytes
pub fn to_protobuf<M: Message>(request: &M) -> Vec<u8> {
    request.encode_to_vec()
}

/// Serialize a trace request to OTLP JSON bytes
#[allow(dead_code)]
pub fn traces_to_json(request: &ExportTraceServiceRequest) -> Vec<u8> {
    serde_json::to_vec(&trace_request_to_json(request)).unwrap()
}

/// Serialize a metrics request to OTLP JSON bytes
#[allow(dead_code)]
pub fn metrics_to_json(request: &ExportMetricsServiceRequest) -> Vec<u8> {
    serde_json::to_vec(&metrics_request_to_json(request)).unwrap()
}
