// otlp-ingest - OTLP ingest server
//
// Thin facade over the workspace crates for the binary: runtime
// configuration and the HTTP server.

pub use otlp_ingest_config as config;

pub use otlp_ingest_server::{
    build_router, init_tracing, run, run_with_config, AppState, ConsoleSink, RecordSink,
    TracingSink,
};
