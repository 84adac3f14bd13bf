// Lenient accessors over OTLP JSON values
//
// OTLP JSON encodes 64-bit integers as decimal strings, doubles may be the
// strings "NaN"/"Infinity", and producers disagree on field casing. These
// helpers absorb all of that so the flattener can stay shape-tolerant.

use serde_json::Value as JsonValue;

use crate::field_names::otlp::FieldName;

/// Look up a field by either spelling, treating JSON `null` as absent.
pub(crate) fn field<'a>(value: &'a JsonValue, name: FieldName) -> Option<&'a JsonValue> {
    let (camel, snake) = name;
    value
        .get(camel)
        .filter(|v| !v.is_null())
        .or_else(|| value.get(snake).filter(|v| !v.is_null()))
}

/// The array stored under `name`, or an empty slice for any other shape.
pub(crate) fn array<'a>(value: &'a JsonValue, name: FieldName) -> &'a [JsonValue] {
    field(value, name)
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The first of several container names that holds an array.
pub(crate) fn first_array<'a>(value: &'a JsonValue, names: &[FieldName]) -> &'a [JsonValue] {
    names
        .iter()
        .map(|name| array(value, *name))
        .find(|items| !items.is_empty())
        .unwrap_or(&[])
}

/// Non-empty string stored under `name`.
pub(crate) fn string(value: &JsonValue, name: FieldName) -> Option<String> {
    field(value, name)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a number that may be encoded as a JSON number or a numeric string.
pub(crate) fn lenient_f64(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => match s.trim() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.parse::<f64>().ok(),
        },
        _ => None,
    }
}

/// Parse a signed integer from a JSON number or decimal string.
pub(crate) fn lenient_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse an unsigned integer (nanosecond timestamps) from a number or string.
pub(crate) fn lenient_u64(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        JsonValue::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Parse a boolean from a JSON bool or the strings "true"/"false".
pub(crate) fn lenient_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) => s.trim().parse::<bool>().ok(),
        _ => None,
    }
}
