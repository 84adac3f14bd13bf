// JSON-lines append log for the generic ingest endpoint

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::counter;
use otlp_ingest_core::timestamp::format_millis;
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Appends one `{received_at, payload}` line per ingest request.
///
/// The file (and its parent directories) is created on the first write and
/// kept open afterwards; a failed write closes it so the next one reopens.
#[derive(Debug)]
pub struct AppendLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl AppendLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and flush it.
    pub async fn append(&self, received_at: DateTime<Utc>, payload: &JsonValue) -> Result<()> {
        let mut line = serde_json::to_vec(&json!({
            "received_at": format_millis(&received_at),
            "payload": payload,
        }))
        .context("Failed to serialize ingest payload")?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        if file.is_none() {
            *file = Some(self.open().await?);
        }

        if let Some(handle) = file.as_mut() {
            let written = async {
                handle.write_all(&line).await?;
                handle.flush().await
            }
            .await;
            if let Err(e) = written {
                *file = None;
                return Err(e).with_context(|| {
                    format!("Failed to append to {}", self.path.display())
                });
            }
        }

        debug!(path = %self.path.display(), bytes = line.len(), "Appended ingest payload");
        Ok(())
    }

    /// Append in the background. Failures are logged, never reported.
    pub fn spawn_append(
        self: &Arc<Self>,
        received_at: DateTime<Utc>,
        payload: JsonValue,
    ) -> JoinHandle<()> {
        let log = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = log.append(received_at, &payload).await {
                counter!("otlp.ingest.append_errors").increment(1);
                warn!(
                    error = %e,
                    path = %log.path.display(),
                    "Failed to append ingest payload"
                );
            }
        })
    }

    async fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open append log {}", self.path.display()))
    }
}
