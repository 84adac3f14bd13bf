// OTLP attribute model
//
// An OTLP `AnyValue` is a tagged union. In JSON it arrives as an object with
// (ideally) exactly one populated variant key; we resolve it once into
// `AttributeValue` and match on that everywhere else.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::field_names::otlp;
use crate::json::{array, field, lenient_bool, lenient_f64, lenient_i64};

/// A resolved OTLP `AnyValue`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Double(f64),
    Int(i64),
    Bool(bool),
    /// Bytes keep their wire rendering (base64 in OTLP JSON).
    Bytes(String),
    Array(Vec<AttributeValue>),
    KvList(AttributeMap),
}

impl AttributeValue {
    /// Resolve an OTLP JSON `AnyValue` object.
    ///
    /// Variants are checked in the fixed order string, double, int, bool,
    /// bytes, array, kvlist; the first one that is present and parses wins.
    pub fn from_any_value(value: &JsonValue) -> Option<Self> {
        if let Some(s) = field(value, otlp::STRING_VALUE) {
            return Some(match s {
                JsonValue::String(s) => Self::String(s.clone()),
                other => Self::String(other.to_string()),
            });
        }
        if let Some(d) = field(value, otlp::DOUBLE_VALUE).and_then(lenient_f64) {
            return Some(Self::Double(d));
        }
        if let Some(i) = field(value, otlp::INT_VALUE).and_then(lenient_i64) {
            return Some(Self::Int(i));
        }
        if let Some(b) = field(value, otlp::BOOL_VALUE).and_then(lenient_bool) {
            return Some(Self::Bool(b));
        }
        if let Some(bytes) = field(value, otlp::BYTES_VALUE).and_then(JsonValue::as_str) {
            return Some(Self::Bytes(bytes.to_string()));
        }
        if let Some(list) = field(value, otlp::ARRAY_VALUE) {
            let items = array(list, otlp::VALUES)
                .iter()
                .filter_map(Self::from_any_value)
                .collect();
            return Some(Self::Array(items));
        }
        if let Some(kvlist) = field(value, otlp::KVLIST_VALUE) {
            return Some(Self::KvList(AttributeMap::from_key_values(array(
                kvlist,
                otlp::VALUES,
            ))));
        }
        None
    }

    /// Whether this value can live in a flat label map.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Array(_) | Self::KvList(_))
    }

    /// Scalar projection used for labels; `None` for arrays and kvlists.
    pub fn to_label(&self) -> Option<LabelValue> {
        match self {
            Self::String(s) | Self::Bytes(s) => Some(LabelValue::String(s.clone())),
            Self::Double(d) => Some(LabelValue::Double(*d)),
            Self::Int(i) => Some(LabelValue::Int(*i)),
            Self::Bool(b) => Some(LabelValue::Bool(*b)),
            Self::Array(_) | Self::KvList(_) => None,
        }
    }

    /// Text rendering of a scalar value; `None` for nested values.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::String(s) | Self::Bytes(s) => Some(s.clone()),
            Self::Double(d) => Some(d.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Array(_) | Self::KvList(_) => None,
        }
    }

    /// Integer view of a scalar (HTTP status codes arrive as ints or strings).
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Double(d) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Finite numeric view of a scalar.
    pub fn to_f64(&self) -> Option<f64> {
        let number = match self {
            Self::Double(d) => *d,
            Self::Int(i) => *i as f64,
            Self::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        number.is_finite().then_some(number)
    }

    /// Non-empty text view of a scalar.
    pub fn to_non_empty_text(&self) -> Option<String> {
        self.to_text().filter(|text| !text.is_empty())
    }
}

/// Scalar value stored in a flat label map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LabelValue {
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl From<&str> for LabelValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Flat, ordered label map carried by every record.
pub type Labels = BTreeMap<String, LabelValue>;

/// Ordered attribute map; a repeated key keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap(BTreeMap<String, AttributeValue>);

impl AttributeMap {
    /// Build from a list of OTLP `KeyValue` objects.
    ///
    /// Entries without a key or without a recognizable value are skipped.
    pub fn from_key_values(key_values: &[JsonValue]) -> Self {
        let mut map = BTreeMap::new();
        for kv in key_values {
            let Some(key) = field(kv, otlp::KEY).and_then(JsonValue::as_str) else {
                continue;
            };
            let Some(value) = field(kv, otlp::VALUE).and_then(AttributeValue::from_any_value)
            else {
                continue;
            };
            map.insert(key.to_string(), value);
        }
        Self(map)
    }

    /// Attributes of an OTLP object (resource, span, data point, log record).
    pub fn of(owner: &JsonValue) -> Self {
        Self::from_key_values(array(owner, otlp::ATTRIBUTES))
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    /// Non-empty text of the first key present among `keys`.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.get(key).and_then(AttributeValue::to_text))
            .find(|text| !text.is_empty())
    }

    /// The first key among `keys` whose value `convert` accepts, with the
    /// converted value.
    pub fn first_converted<'k, T, F>(&self, keys: &[&'k str], convert: F) -> Option<(&'k str, T)>
    where
        F: Fn(&AttributeValue) -> Option<T>,
    {
        keys.iter()
            .find_map(|key| self.get(key).and_then(&convert).map(|value| (*key, value)))
    }

    /// Project onto scalar labels, counting nested values that were dropped.
    pub fn to_labels(&self, nested_dropped: &mut usize) -> Labels {
        let mut labels = Labels::new();
        for (key, value) in &self.0 {
            match value.to_label() {
                Some(label) => {
                    labels.insert(key.clone(), label);
                }
                None => *nested_dropped += 1,
            }
        }
        labels
    }
}
