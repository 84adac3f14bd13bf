// Shipped structured-log sanitizing
//
// Log shippers such as Fluent Bit forward the JSON lines services print as a
// batch of flat objects. Each entry is brought to the uniform `LogRecord`
// shape (defaults filled in, numbers coerced) and validated; entries that
// cannot be sanitized are counted, never fatal.

use serde_json::{Map, Value as JsonValue};

use crate::field_names::shipped;
use crate::flatten::{is_health_check_path, FlattenConfig};
use crate::json::{lenient_f64, lenient_i64};
use crate::records::LogRecord;
use crate::timestamp::{epoch_seconds_to_datetime, format_millis};

type Entry = Map<String, JsonValue>;

/// Result of sanitizing one shipped batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizedBatch {
    pub records: Vec<LogRecord>,
    /// Entries that passed validation (equals `records.len()`)
    pub processed: usize,
    /// Entries that were not objects or failed validation
    pub discarded: usize,
    /// Valid entries dropped by the health-check path filter
    pub filtered: usize,
}

/// Sanitize and validate a batch of shipped log entries.
///
/// A top-level array is the batch; a single object is a batch of one; any
/// other shape is an empty batch.
pub fn sanitize_batch(batch: &JsonValue, config: &FlattenConfig) -> SanitizedBatch {
    let entries = match batch {
        JsonValue::Array(entries) => entries.as_slice(),
        JsonValue::Object(_) => std::slice::from_ref(batch),
        _ => &[],
    };

    let mut result = SanitizedBatch::default();
    for entry in entries {
        let Some(entry) = entry.as_object() else {
            result.discarded += 1;
            continue;
        };
        let record = sanitize_entry(entry);
        if !record.is_valid() {
            result.discarded += 1;
            continue;
        }
        if record.http_path.as_deref().is_some_and(|path| {
            is_health_check_path(&config.health_check_path_filters, path)
        }) {
            result.filtered += 1;
            continue;
        }
        result.records.push(record);
    }
    result.processed = result.records.len();
    result
}

/// Fill every field of the uniform log shape from one entry.
pub fn sanitize_entry(entry: &Entry) -> LogRecord {
    LogRecord {
        kind: text(entry, shipped::TYPE).unwrap_or_else(|| LogRecord::DEFAULT_TYPE.to_string()),
        timestamp: timestamp(entry).unwrap_or_default(),
        service_name: shipped::SERVICE_NAME_KEYS
            .iter()
            .find_map(|key| text(entry, key))
            .unwrap_or_default(),
        environment: text(entry, shipped::ENVIRONMENT),
        level: text(entry, shipped::LEVEL)
            .map(|level| level.to_uppercase())
            .unwrap_or_else(|| LogRecord::DEFAULT_LEVEL.to_string()),
        message: text(entry, shipped::MESSAGE).unwrap_or_default(),
        trace_id: text(entry, shipped::TRACE_ID),
        span_id: text(entry, shipped::SPAN_ID),
        context: text(entry, shipped::CONTEXT),
        http_method: text(entry, shipped::HTTP_METHOD),
        http_path: text(entry, shipped::HTTP_PATH),
        http_status_code: entry.get(shipped::HTTP_STATUS_CODE).and_then(lenient_i64),
        duration_ms: entry
            .get(shipped::DURATION_MS)
            .and_then(lenient_f64)
            .filter(|duration| duration.is_finite()),
        client_ip: text(entry, shipped::CLIENT_IP),
        stack: text(entry, shipped::STACK),
    }
}

/// Non-empty text of a field; numbers and booleans are rendered.
fn text(entry: &Entry, key: &str) -> Option<String> {
    match entry.get(key)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First usable timestamp field. Strings are kept verbatim; numbers are
/// epoch seconds (Fluent Bit's `date`) rendered as RFC 3339.
fn timestamp(entry: &Entry) -> Option<String> {
    shipped::TIMESTAMP_KEYS
        .iter()
        .find_map(|key| match entry.get(*key)? {
            JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
            JsonValue::Number(n) => n
                .as_f64()
                .and_then(epoch_seconds_to_datetime)
                .map(|ts| format_millis(&ts)),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_processed_and_discarded() {
        let batch = json!([
            {"timestamp": "2024-01-15T12:00:00.000Z", "service_name": "cart", "message": "ok"},
            {"service_name": "cart"}
        ]);
        let result = sanitize_batch(&batch, &FlattenConfig::default());

        assert_eq!(result.processed, 1);
        assert_eq!(result.discarded, 1);
        assert_eq!(result.records[0].service_name, "cart");
    }

    #[test]
    fn fills_defaults() {
        let batch = json!([{
            "timestamp": "2024-01-15T12:00:00.000Z",
            "service_name": "cart",
            "message": "hello",
            "level": "warn"
        }]);
        let record = &sanitize_batch(&batch, &FlattenConfig::default()).records[0];

        assert_eq!(record.kind, "log");
        assert_eq!(record.level, "WARN");
        assert_eq!(record.trace_id, None);
        assert_eq!(record.http_status_code, None);

        let json = serde_json::to_value(record).unwrap();
        assert!(json["stack"].is_null());
        assert_eq!(json["type"], "log");
    }

    #[test]
    fn fallback_fields_and_coercions() {
        let entry = json!({
            "date": 1705327800.5,
            "service": "orders",
            "message": "POST /orders",
            "http_status_code": "201",
            "duration_ms": "12.5",
            "trace_id": null
        });
        let record = sanitize_entry(entry.as_object().unwrap());

        assert_eq!(record.timestamp, "2024-01-15T14:10:00.500Z");
        assert_eq!(record.service_name, "orders");
        assert_eq!(record.level, "INFO");
        assert_eq!(record.http_status_code, Some(201));
        assert_eq!(record.duration_ms, Some(12.5));
        assert_eq!(record.trace_id, None);
    }

    #[test]
    fn timestamp_priority() {
        let entry = json!({"@timestamp": "b", "time": "c", "timestamp": ""});
        assert_eq!(timestamp(entry.as_object().unwrap()).as_deref(), Some("b"));
    }

    #[test]
    fn single_object_and_junk_entries() {
        let config = FlattenConfig::default();
        let single = json!({"timestamp": "t", "service_name": "s", "message": "m"});
        assert_eq!(sanitize_batch(&single, &config).processed, 1);

        let junk = json!([1, "line", null]);
        let result = sanitize_batch(&junk, &config);
        assert_eq!(result.processed, 0);
        assert_eq!(result.discarded, 3);

        assert_eq!(sanitize_batch(&json!("text"), &config), SanitizedBatch::default());
    }

    #[test]
    fn health_check_entries_are_filtered() {
        let config = FlattenConfig {
            health_check_path_filters: vec!["/health".into()],
            ..Default::default()
        };
        let batch = json!([
            {"timestamp": "t", "service_name": "s", "message": "m", "http_path": "/health"},
            {"timestamp": "t", "service_name": "s", "message": "m", "http_path": "/cart"}
        ]);
        let result = sanitize_batch(&batch, &config);
        assert_eq!(result.processed, 1);
        assert_eq!(result.filtered, 1);
        assert_eq!(result.discarded, 0);
    }
}
