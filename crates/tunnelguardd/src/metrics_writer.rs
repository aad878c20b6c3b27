//! Periodic Prometheus textfile writer.
//!
//! The file is written next to its final path and renamed into place, so a
//! node_exporter textfile collector never reads a partial file.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use tunnelguard_core::{GuardMetrics, MetricsSnapshot};

use crate::error::ExportError;
use crate::exporter;

pub const WRITE_INTERVAL: Duration = Duration::from_secs(60);

pub struct MetricsWriter {
    path: PathBuf,
}

impl MetricsWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    /// Renders `snapshot` and atomically replaces the metrics file.
    pub async fn write(&self, snapshot: &MetricsSnapshot) -> Result<(), ExportError> {
        let body = exporter::render(snapshot)?;
        let tmp = self.tmp_path();

        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| ExportError::Write {
                path: tmp.clone(),
                source: e,
            })?;

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ExportError::Write {
                path: self.path.clone(),
                source: e,
            })
    }

    /// Writes the metrics file every [`WRITE_INTERVAL`] until `cancel` fires.
    pub async fn run(self, metrics: Arc<GuardMetrics>, cancel: CancellationToken) {
        info!(path = %self.path.display(), "Starting metrics writer");

        let mut ticker = tokio::time::interval(WRITE_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.write(&metrics.snapshot()).await {
                Ok(()) => debug!(path = %self.path.display(), "Wrote metrics file"),
                Err(e) => error!(error = %e, "Failed to write metrics"),
            }
        }

        info!("Metrics writer stopped");
    }
}
