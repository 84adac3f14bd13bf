// Integration tests for otlp-ingest-core
//
// Tests the complete workflow from OTLP bytes to flat records

use chrono::{TimeZone, Utc};
use opentelemetry_proto::tonic::{
    collector::{
        metrics::v1::ExportMetricsServiceRequest, trace::v1::ExportTraceServiceRequest,
    },
    common::v1::{any_value, AnyValue, InstrumentationScope, KeyValue},
    metrics::v1::{
        metric::Data, number_data_point, Gauge, Histogram, HistogramDataPoint, Metric,
        NumberDataPoint, ResourceMetrics, ScopeMetrics, Summary, SummaryDataPoint,
    },
    resource::v1::Resource,
    trace::v1::{span, status, ResourceSpans, ScopeSpans, Span, Status},
};
use otlp_ingest_core::{
    decode_payload, FlattenConfig, Flattener, InputFormat, LabelValue, ProcessedCountMode,
    Signal, SpanKind, SpanStatus,
};
use prost::Message;

fn string_attr(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::StringValue(value.to_string())),
        }),
    }
}

fn int_attr(key: &str, value: i64) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::IntValue(value)),
        }),
    }
}

fn checkout_resource() -> Option<Resource> {
    Some(Resource {
        attributes: vec![
            string_attr("service.name", "checkout"),
            string_attr("deployment.environment", "prod"),
        ],
        ..Default::default()
    })
}

/// Create a sample OTLP trace request with one resource and two spans
fn create_sample_trace_request() -> Vec<u8> {
    let request = ExportTraceServiceRequest {
        resource_spans: vec![ResourceSpans {
            resource: checkout_resource(),
            scope_spans: vec![ScopeSpans {
                scope: Some(InstrumentationScope {
                    name: "checkout-tracer".to_string(),
                    version: "1.0.0".to_string(),
                    ..Default::default()
                }),
                spans: vec![
                    Span {
                        trace_id: vec![0x5b; 16],
                        span_id: vec![0xee; 8],
                        name: "GET /cart".to_string(),
                        kind: span::SpanKind::Server as i32,
                        start_time_unix_nano: 1_705_327_800_000_000_000,
                        end_time_unix_nano: 1_705_327_800_250_000_000,
                        attributes: vec![
                            string_attr("http.method", "GET"),
                            string_attr("http.route", "/cart"),
                            int_attr("http.status_code", 200),
                            string_attr("user.tier", "gold"),
                        ],
                        status: Some(Status {
                            message: String::new(),
                            code: status::StatusCode::Ok as i32,
                        }),
                        ..Default::default()
                    },
                    Span {
                        trace_id: vec![0x5b; 16],
                        span_id: vec![0xef; 8],
                        parent_span_id: vec![0xee; 8],
                        name: "SELECT cart".to_string(),
                        kind: span::SpanKind::Client as i32,
                        start_time_unix_nano: 1_705_327_800_010_000_000,
                        end_time_unix_nano: 1_705_327_800_020_000_000,
                        status: Some(Status {
                            message: "timeout".to_string(),
                            code: status::StatusCode::Error as i32,
                        }),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        }],
    };
    request.encode_to_vec()
}

fn create_sample_metrics_request() -> Vec<u8> {
    let request = ExportMetricsServiceRequest {
        resource_metrics: vec![ResourceMetrics {
            resource: checkout_resource(),
            scope_metrics: vec![ScopeMetrics {
                metrics: vec![
                    Metric {
                        name: "process.cpu".to_string(),
                        unit: "1".to_string(),
                        data: Some(Data::Gauge(Gauge {
                            data_points: vec![NumberDataPoint {
                                time_unix_nano: 1_705_327_800_000_000_000,
                                value: Some(number_data_point::Value::AsDouble(4.5)),
                                attributes: vec![string_attr("cpu", "0")],
                                ..Default::default()
                            }],
                        })),
                        ..Default::default()
                    },
                    Metric {
                        name: "http.server.duration".to_string(),
                        unit: "ms".to_string(),
                        data: Some(Data::Histogram(Histogram {
                            data_points: vec![HistogramDataPoint {
                                time_unix_nano: 1_705_327_800_000_000_000,
                                count: 3,
                                sum: Some(42.0),
                                bucket_counts: vec![1, 2],
                                explicit_bounds: vec![10.0],
                                ..Default::default()
                            }],
                            aggregation_temporality: 2,
                        })),
                        ..Default::default()
                    },
                    Metric {
                        name: "rpc.latency".to_string(),
                        data: Some(Data::Summary(Summary {
                            data_points: vec![SummaryDataPoint {
                                count: 1,
                                sum: 1.0,
                                ..Default::default()
                            }],
                        })),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        }],
    };
    request.encode_to_vec()
}

#[test]
fn test_protobuf_traces_to_span_records() {
    let body = create_sample_trace_request();
    let decoded = decode_payload(Signal::Traces, InputFormat::Protobuf, &body);
    assert!(decoded.error.is_none());

    let received_at = Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
    let flattened = Flattener::default().flatten_traces(&decoded.value, received_at);

    assert_eq!(flattened.processed(ProcessedCountMode::ResourceGroups), 1);
    assert_eq!(flattened.records.len(), 2);

    let server = &flattened.records[0];
    assert_eq!(server.service_name, "checkout");
    assert_eq!(server.environment, "prod");
    assert_eq!(server.trace_id, "5b".repeat(16));
    assert_eq!(server.span_id, "ee".repeat(8));
    assert_eq!(server.parent_span_id, None);
    assert_eq!(server.kind, SpanKind::Server);
    assert_eq!(server.status, SpanStatus::Ok);
    assert_eq!(server.duration_ms, 250.0);
    assert_eq!(server.http_method.as_deref(), Some("GET"));
    assert_eq!(server.http_path.as_deref(), Some("/cart"));
    assert_eq!(server.http_status_code, Some(200));
    assert_eq!(server.labels.len(), 1);
    assert_eq!(server.labels["user.tier"], LabelValue::from("gold"));

    let json = serde_json::to_value(server).unwrap();
    assert_eq!(json["timestamp"], "2024-01-15T14:10:00.000Z");

    let client = &flattened.records[1];
    assert_eq!(client.parent_span_id.as_deref(), Some("ee".repeat(8).as_str()));
    assert_eq!(client.status, SpanStatus::Error);
    assert_eq!(client.status_message.as_deref(), Some("timeout"));
    assert_eq!(client.duration_ms, 10.0);
}

#[test]
fn test_protobuf_and_json_flatten_identically() {
    let body = create_sample_trace_request();
    let from_protobuf = decode_payload(Signal::Traces, InputFormat::Protobuf, &body).value;
    let json_body = serde_json::to_vec(&from_protobuf).unwrap();
    let from_json = decode_payload(Signal::Traces, InputFormat::Json, &json_body).value;

    let received_at = Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
    let flattener = Flattener::default();
    assert_eq!(
        flattener.flatten_traces(&from_protobuf, received_at),
        flattener.flatten_traces(&from_json, received_at)
    );
}

#[test]
fn test_protobuf_metrics_to_metric_records() {
    let body = create_sample_metrics_request();
    let decoded = decode_payload(Signal::Metrics, InputFormat::Protobuf, &body);
    assert!(decoded.error.is_none());

    let received_at = Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
    let flattener = Flattener::new(FlattenConfig {
        processed_count_mode: ProcessedCountMode::FlatRecords,
        ..Default::default()
    });
    let flattened = flattener.flatten_metrics(&decoded.value, received_at);

    assert_eq!(flattened.processed(ProcessedCountMode::FlatRecords), 2);
    assert_eq!(flattened.stats.skipped.summaries, 1);

    let cpu = &flattened.records[0];
    assert_eq!(cpu.metric_name, "process.cpu");
    assert_eq!(cpu.value, Some(4.5));
    assert_eq!(cpu.labels["cpu"], LabelValue::from("0"));
    assert_eq!(cpu.labels["service.name"], LabelValue::from("checkout"));

    let duration = &flattened.records[1];
    assert_eq!(duration.unit.as_deref(), Some("ms"));
    assert_eq!(duration.value, Some(42.0));
}

#[test]
fn test_truncated_protobuf_yields_no_records() {
    let mut body = create_sample_trace_request();
    body.truncate(body.len() / 2);

    let decoded = decode_payload(Signal::Traces, InputFormat::Protobuf, &body);
    assert!(decoded.is_null());
    assert!(decoded.error.is_some());

    let flattened = Flattener::default().flatten_traces(&decoded.value, Utc::now());
    assert!(flattened.records.is_empty());
    assert_eq!(flattened.processed(ProcessedCountMode::ResourceGroups), 0);
}
