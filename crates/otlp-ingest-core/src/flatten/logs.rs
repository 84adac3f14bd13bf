// OTLP log record flattening
//
// Produces the same `LogRecord` shape the shipped-log sanitizer does, so both
// log paths feed one downstream schema.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use super::{
    id_field, timestamp_field, walk, FlattenStats, Flattened, Flattener, ResourceContext, LOGS,
};
use crate::attributes::{AttributeMap, AttributeValue};
use crate::field_names::{otlp, semconv};
use crate::json::{field, lenient_i64, string};
use crate::records::LogRecord;
use crate::timestamp::format_millis;

pub(super) fn flatten(
    flattener: &Flattener,
    decoded: &JsonValue,
    received_at: DateTime<Utc>,
) -> Flattened<LogRecord> {
    let mut records = Vec::new();
    let mut stats = FlattenStats::default();

    walk(decoded, &LOGS, &mut stats, |resource, log, stats| {
        let record = log_record(resource, log, received_at);
        if !record.is_valid() {
            stats.invalid_records += 1;
            return;
        }
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

fn log_record(
    resource: &ResourceContext,
    log: &JsonValue,
    received_at: DateTime<Utc>,
) -> LogRecord {
    let attributes = AttributeMap::of(log);
    let text = |keys: &[&str]| attributes.first_text(keys);
    let timestamp = timestamp_field(log, otlp::TIME_UNIX_NANO)
        .or_else(|| timestamp_field(log, otlp::OBSERVED_TIME_UNIX_NANO))
        .unwrap_or(received_at);

    LogRecord {
        kind: text(semconv::LOG_TYPE_KEYS).unwrap_or_else(|| LogRecord::DEFAULT_TYPE.to_string()),
        timestamp: format_millis(&timestamp),
        service_name: resource.service_name.clone(),
        environment: Some(resource.environment.clone()),
        level: level(log),
        message: field(log, otlp::BODY).map(body_text).unwrap_or_default(),
        trace_id: id_field(log, otlp::TRACE_ID),
        span_id: id_field(log, otlp::SPAN_ID),
        context: text(semconv::LOG_CONTEXT_KEYS),
        http_method: text(semconv::LOG_HTTP_METHOD_KEYS),
        http_path: text(semconv::LOG_HTTP_PATH_KEYS),
        http_status_code: attributes
            .first_converted(semconv::LOG_HTTP_STATUS_CODE_KEYS, AttributeValue::to_i64)
            .map(|(_, code)| code),
        duration_ms: attributes
            .first_converted(semconv::LOG_DURATION_MS_KEYS, AttributeValue::to_f64)
            .map(|(_, duration)| duration),
        client_ip: text(semconv::LOG_CLIENT_IP_KEYS),
        stack: text(semconv::LOG_STACK_KEYS),
    }
}

/// Upper-cased severity text, else the severity number's range name.
fn level(log: &JsonValue) -> String {
    if let Some(text) = string(log, otlp::SEVERITY_TEXT) {
        return text.to_uppercase();
    }
    let number = match field(log, otlp::SEVERITY_NUMBER) {
        Some(JsonValue::String(name)) => {
            severity_number_from_str(name).or_else(|| name.parse().ok())
        }
        Some(other) => lenient_i64(other),
        None => None,
    };
    number
        .and_then(severity_level)
        .unwrap_or(LogRecord::DEFAULT_LEVEL)
        .to_string()
}

fn severity_number_from_str(name: &str) -> Option<i64> {
    let level = name.strip_prefix("SEVERITY_NUMBER_")?;
    let (base, offset) = match level.char_indices().last() {
        Some((index, digit @ '2'..='4')) => (&level[..index], i64::from(digit as u8 - b'1')),
        _ => (level, 0),
    };
    let first = match base {
        "TRACE" => 1,
        "DEBUG" => 5,
        "INFO" => 9,
        "WARN" => 13,
        "ERROR" => 17,
        "FATAL" => 21,
        _ => return None,
    };
    Some(first + offset)
}

fn severity_level(number: i64) -> Option<&'static str> {
    match number {
        1..=4 => Some("TRACE"),
        5..=8 => Some("DEBUG"),
        9..=12 => Some("INFO"),
        13..=16 => Some("WARN"),
        17..=20 => Some("ERROR"),
        21..=24 => Some("FATAL"),
        _ => None,
    }
}

/// Message text of a log body. A kvlist body contributes its `message` entry.
fn body_text(body: &JsonValue) -> String {
    match AttributeValue::from_any_value(body) {
        Some(AttributeValue::KvList(map)) => map
            .get("message")
            .and_then(AttributeValue::to_text)
            .unwrap_or_default(),
        Some(value) => value.to_text().unwrap_or_default(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::FlattenConfig;
    use chrono::TimeZone;
    use serde_json::json;

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn request(records: JsonValue) -> JsonValue {
        json!({
            "resourceLogs": [{
                "resource": {"attributes": [
                    {"key": "service.name", "value": {"stringValue": "checkout"}},
                    {"key": "deployment.environment", "value": {"stringValue": "prod"}}
                ]},
                "scopeLogs": [{"logRecords": records}]
            }]
        })
    }

    #[test]
    fn maps_log_record_fields() {
        let value = request(json!([{
            "timeUnixNano": "1705327800123456789",
            "severityText": "warn",
            "body": {"stringValue": "GET /cart"},
            "traceId": "5b8efff798038103d269b633813fc60c",
            "spanId": "eee19b7ec3c1b174",
            "attributes": [
                {"key": "http_method", "value": {"stringValue": "GET"}},
                {"key": "http_path", "value": {"stringValue": "/cart"}},
                {"key": "http_status_code", "value": {"intValue": "200"}},
                {"key": "duration_ms", "value": {"doubleValue": 12.5}},
                {"key": "context", "value": {"stringValue": "CartController"}}
            ]
        }]));

        let flattened = Flattener::default().flatten_logs(&value, received_at());
        let record = &flattened.records[0];

        assert_eq!(record.kind, "log");
        assert_eq!(record.timestamp, "2024-01-15T14:10:00.123Z");
        assert_eq!(record.service_name, "checkout");
        assert_eq!(record.environment.as_deref(), Some("prod"));
        assert_eq!(record.level, "WARN");
        assert_eq!(record.message, "GET /cart");
        assert_eq!(record.trace_id.as_deref(), Some("5b8efff798038103d269b633813fc60c"));
        assert_eq!(record.http_method.as_deref(), Some("GET"));
        assert_eq!(record.http_path.as_deref(), Some("/cart"));
        assert_eq!(record.http_status_code, Some(200));
        assert_eq!(record.duration_ms, Some(12.5));
        assert_eq!(record.context.as_deref(), Some("CartController"));
        assert_eq!(record.client_ip, None);
    }

    #[test]
    fn level_from_severity_number() {
        let cases = [
            (json!({"severityNumber": 17}), "ERROR"),
            (json!({"severityNumber": "SEVERITY_NUMBER_WARN2"}), "WARN"),
            (json!({"severityNumber": "SEVERITY_NUMBER_FATAL"}), "FATAL"),
            (json!({"severityNumber": "5"}), "DEBUG"),
            (json!({"severityNumber": 0}), "INFO"),
            (json!({}), "INFO"),
        ];
        for (log, expected) in cases {
            assert_eq!(level(&log), expected, "log {log}");
        }
        assert_eq!(severity_number_from_str("SEVERITY_NUMBER_INFO4"), Some(12));
        assert_eq!(severity_number_from_str("SEVERITY_NUMBER_BOGUS"), None);
    }

    #[test]
    fn records_without_message_are_invalid() {
        let value = request(json!([
            {"body": {"stringValue": ""}},
            {"body": {"kvlistValue": {"values": [
                {"key": "message", "value": {"stringValue": "structured"}}
            ]}}},
            {}
        ]));
        let flattened = Flattener::default().flatten_logs(&value, received_at());

        assert_eq!(flattened.records.len(), 1);
        assert_eq!(flattened.records[0].message, "structured");
        assert_eq!(flattened.records[0].timestamp, "2024-01-15T12:00:00.000Z");
        assert_eq!(flattened.stats.invalid_records, 2);
    }

    #[test]
    fn observed_time_is_the_fallback_timestamp() {
        let value = request(json!([{
            "observedTimeUnixNano": "1705327800000000000",
            "body": {"stringValue": "late"}
        }]));
        let flattened = Flattener::default().flatten_logs(&value, received_at());
        assert_eq!(flattened.records[0].timestamp, "2024-01-15T14:10:00.000Z");
    }

    #[test]
    fn health_check_logs_are_filtered() {
        let flattener = Flattener::new(FlattenConfig {
            health_check_path_filters: vec!["/health".into()],
            ..Default::default()
        });
        let value = request(json!([{
            "body": {"stringValue": "GET /health"},
            "attributes": [{"key": "http.target", "value": {"stringValue": "/health"}}]
        }]));
        let flattened = flattener.flatten_logs(&value, received_at());
        assert!(flattened.records.is_empty());
        assert_eq!(flattened.stats.filtered, 1);
    }
}
