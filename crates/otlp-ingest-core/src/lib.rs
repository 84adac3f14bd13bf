// otlp-ingest-core - Platform-agnostic ingestion core
//
// This crate contains the PURE processing logic for turning OTLP payloads
// into flat records. No I/O, no async, no runtime dependencies.
//
// Pipeline: bytes + content type → decode → flatten → emission payload.
// Writing the emission somewhere is the server crate's job.

pub mod attributes;
pub mod decode;
pub mod emit;
pub mod field_names;
pub mod flatten;
mod json;
pub mod records;
pub mod sanitize;
pub mod timestamp;

// Re-export commonly used types
pub use attributes::{AttributeMap, AttributeValue, LabelValue, Labels};
pub use decode::{decode_payload, DecodeError, Decoded, InputFormat, Signal};
pub use emit::{telemetry_emission, EmitMode, Emission, EmissionPayload};
pub use flatten::{
    FlattenConfig, FlattenStats, Flattened, Flattener, MetricSkipCounts, ProcessedCountMode,
};
pub use records::{LogRecord, MetricKind, MetricRecord, SpanKind, SpanRecord, SpanStatus};
pub use sanitize::{sanitize_batch, SanitizedBatch};

/// Placeholder used when a resource carries neither `service.name` nor `host.name`.
pub const UNKNOWN_SERVICE_NAME: &str = "unknown-service";

/// Placeholder used when a resource carries no deployment environment.
pub const UNKNOWN_ENVIRONMENT: &str = "unknown";
