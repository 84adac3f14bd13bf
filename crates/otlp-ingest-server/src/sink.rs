// Emission sinks
//
// Where the flat records of each request end up. Console output is the
// default and what downstream log collectors scrape.

use anyhow::{anyhow, Context, Result};
use metrics::counter;
use otlp_ingest_config::{EmitConfig, SinkKind};
use otlp_ingest_core::{Emission, EmissionPayload};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Destination for emissions. Called once per request from request tasks.
pub trait RecordSink: Send + Sync {
    fn emit(&self, emission: &Emission) -> Result<()>;
}

/// Shared output of a [`ConsoleSink`]; one document is written per lock.
type ConsoleWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// One JSON document per emission on stdout.
///
/// The write itself runs on tokio's blocking pool when called from inside a
/// runtime, so a slow stdout reader never holds up a response.
#[derive(Clone)]
pub struct ConsoleSink {
    pretty: bool,
    out: ConsoleWriter,
}

impl ConsoleSink {
    pub fn new(pretty: bool) -> Self {
        Self::with_writer(pretty, Box::new(std::io::stdout()))
    }

    /// Console sink over any writer.
    pub fn with_writer(pretty: bool, writer: Box<dyn Write + Send>) -> Self {
        Self {
            pretty,
            out: Arc::new(Mutex::new(writer)),
        }
    }
}

impl RecordSink for ConsoleSink {
    fn emit(&self, emission: &Emission) -> Result<()> {
        // Serialize first so concurrent requests never interleave partial documents
        let mut document = if self.pretty {
            serde_json::to_vec_pretty(emission)
        } else {
            serde_json::to_vec(emission)
        }
        .context("Failed to serialize emission")?;
        document.push(b'\n');

        let Ok(runtime) = Handle::try_current() else {
            return write_document(&self.out, &document);
        };

        let out = Arc::clone(&self.out);
        let processed = emission.processed;
        runtime.spawn_blocking(move || {
            if let Err(e) = write_document(&out, &document) {
                counter!("otlp.ingest.sink_errors").increment(1);
                warn!(error = %e, processed, "Failed to write emission, dropping it");
            }
        });
        Ok(())
    }
}

fn write_document(out: &Mutex<Box<dyn Write + Send>>, document: &[u8]) -> Result<()> {
    let mut out = out
        .lock()
        .map_err(|_| anyhow!("console writer lock poisoned"))?;
    out.write_all(document)
        .and_then(|_| out.flush())
        .context("Failed to write emission to stdout")
}

/// One `tracing` event per emission, for deployments that ship the
/// process's own logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn emit(&self, emission: &Emission) -> Result<()> {
        let payload =
            serde_json::to_string(&emission.payload).context("Failed to serialize emission")?;
        info!(
            target: "otlp_ingest::emit",
            signal = emission.signal.map(|s| s.as_str()).unwrap_or("ingest"),
            format = payload_format(&emission.payload),
            processed = emission.processed,
            records = emission.payload.record_count(),
            payload = %payload,
            "emission"
        );
        Ok(())
    }
}

/// Keeps every emission in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    emissions: Mutex<Vec<Emission>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything emitted so far.
    pub fn take(&self) -> Vec<Emission> {
        self.emissions
            .lock()
            .map(|mut emissions| std::mem::take(&mut *emissions))
            .unwrap_or_default()
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, emission: &Emission) -> Result<()> {
        self.emissions
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?
            .push(emission.clone());
        Ok(())
    }
}

/// Build the sink selected by the emit configuration.
pub fn sink_from_config(config: &EmitConfig) -> Arc<dyn RecordSink> {
    match config.sink {
        SinkKind::Console => Arc::new(ConsoleSink::new(config.pretty)),
        SinkKind::Tracing => Arc::new(TracingSink),
    }
}

fn payload_format(payload: &EmissionPayload) -> &'static str {
    match payload {
        EmissionPayload::Spans(_) => "spans",
        EmissionPayload::Metrics(_) => "metrics",
        EmissionPayload::Logs(_) => "logs",
        EmissionPayload::Raw(_) => "raw",
        EmissionPayload::Ingest(_) => "ingest",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use otlp_ingest_core::Signal;
    use serde_json::json;

    #[test]
    fn test_memory_sink_take_drains() {
        let sink = MemorySink::new();
        let emission = Emission::ingest(Utc::now(), json!({"hello": "world"}));
        sink.emit(&emission).unwrap();
        sink.emit(&emission).unwrap();

        let taken = sink.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0], emission);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_console_and_tracing_sinks_accept_emissions() {
        let emission = Emission::new(
            Some(Signal::Traces),
            Utc::now(),
            0,
            EmissionPayload::Spans(Vec::new()),
        );
        assert!(ConsoleSink::new(false).emit(&emission).is_ok());
        assert!(ConsoleSink::new(true).emit(&emission).is_ok());
        assert!(TracingSink.emit(&emission).is_ok());
    }

    /// Holds every flush until the test opens the gate.
    struct GatedWriter {
        gate: std::sync::mpsc::Receiver<()>,
        written: std::sync::mpsc::Sender<Vec<u8>>,
        buf: Vec<u8>,
    }

    impl Write for GatedWriter {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            let _ = self.gate.recv();
            let _ = self.written.send(std::mem::take(&mut self.buf));
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_console_sink_returns_before_write_completes() {
        let (gate_tx, gate_rx) = std::sync::mpsc::channel();
        let (written_tx, written_rx) = std::sync::mpsc::channel();
        let sink = ConsoleSink::with_writer(
            false,
            Box::new(GatedWriter {
                gate: gate_rx,
                written: written_tx,
                buf: Vec::new(),
            }),
        );

        // The gate is still closed; an inline write would never return here
        let emission = Emission::ingest(Utc::now(), json!({"order": 42}));
        sink.emit(&emission).unwrap();

        gate_tx.send(()).unwrap();
        let document = tokio::task::spawn_blocking(move || written_rx.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(document.last(), Some(&b'\n'));
        let parsed: serde_json::Value = serde_json::from_slice(&document).unwrap();
        assert_eq!(parsed["processed"], 1);
        assert_eq!(parsed["payload"]["format"], "ingest");
        assert_eq!(parsed["payload"]["records"]["order"], 42);
    }

    #[test]
    fn test_sink_from_config() {
        let config = EmitConfig {
            sink: SinkKind::Tracing,
            ..Default::default()
        };
        let sink = sink_from_config(&config);
        let emission = Emission::ingest(Utc::now(), json!([1, 2, 3]));
        assert!(sink.emit(&emission).is_ok());
    }

    #[test]
    fn test_payload_format_names() {
        assert_eq!(payload_format(&EmissionPayload::Raw(None)), "raw");
        assert_eq!(payload_format(&EmissionPayload::Logs(Vec::new())), "logs");
    }
}
