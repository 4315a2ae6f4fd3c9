//! Non-blocking trace records for recommendation requests.
//!
//! The engine hands records to a bounded channel with `try_send`; a background
//! task appends them to a file. A full or closed channel drops the record.

use chrono::{DateTime, SecondsFormat, Utc};
use std::{fmt, path::PathBuf};
use tokio::{
    fs::OpenOptions,
    io::AsyncWriteExt,
    sync::mpsc::{self, Receiver, Sender},
    task::JoinHandle,
};
use tracing::{debug, trace, warn};

use crate::model::WeatherReading;

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Request(WeatherReading),
    Response(String),
    Fallback(String),
}

#[derive(Debug, Clone)]
pub struct TraceRecord {
    pub at: DateTime<Utc>,
    pub request_id: u64,
    pub event: TraceEvent,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.at.to_rfc3339_opts(SecondsFormat::Millis, true);
        match &self.event {
            TraceEvent::Request(reading) => {
                write!(f, "{at} [#{}] Generating recommendation for: {reading:?}", self.request_id)
            }
            TraceEvent::Response(raw) => {
                write!(f, "{at} [#{}] AI Response: {raw:?}", self.request_id)
            }
            TraceEvent::Fallback(reason) => {
                write!(f, "{at} [#{}] Using fallback: {reason}", self.request_id)
            }
        }
    }
}

/// Cheap handle the engine records into. Cloning shares the same channel.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    tx: Option<Sender<TraceRecord>>,
}

impl DiagnosticSink {
    /// A sink that only emits `tracing` events.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn channel(capacity: usize) -> (Self, Receiver<TraceRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    pub fn record(&self, request_id: u64, event: TraceEvent) {
        let record = TraceRecord { at: Utc::now(), request_id, event };
        debug!(target: "advisor_core::trace", "{record}");

        if let Some(tx) = &self.tx
            && tx.try_send(record).is_err()
        {
            trace!(request_id, "diagnostic channel full or closed, record dropped");
        }
    }
}

/// Drain `rx` into an append-only file until every sender is gone.
///
/// I/O errors are logged and the offending record is skipped.
pub fn spawn_file_writer(path: PathBuf, mut rx: Receiver<TraceRecord>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => f,
            Err(e) => {
                warn!("Failed to open diagnostic log {}: {e}", path.display());
                // keep draining so senders never see a closed channel
                while rx.recv().await.is_some() {}
                return;
            }
        };

        while let Some(record) = rx.recv().await {
            let line = format!("{record}\n");
            if let Err(e) = file.write_all(line.as_bytes()).await {
                warn!("Failed to write diagnostic record: {e}");
            }
        }

        if let Err(e) = file.flush().await {
            warn!("Failed to flush diagnostic log: {e}");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::reading;

    #[test]
    fn disabled_sink_never_panics() {
        let sink = DiagnosticSink::disabled();
        sink.record(1, TraceEvent::Fallback("timeout".into()));
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let (sink, mut rx) = DiagnosticSink::channel(1);

        sink.record(1, TraceEvent::Response("first".into()));
        sink.record(2, TraceEvent::Response("second".into()));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.request_id, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_channel_is_ignored() {
        let (sink, rx) = DiagnosticSink::channel(4);
        drop(rx);
        sink.record(7, TraceEvent::Fallback("gone".into()));
    }

    #[tokio::test]
    async fn file_writer_appends_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, "earlier line\n").unwrap();

        let (sink, rx) = DiagnosticSink::channel(8);
        let writer = spawn_file_writer(path.clone(), rx);

        sink.record(3, TraceEvent::Request(reading(12.0, 0.0, 1.0, "Fog")));
        sink.record(3, TraceEvent::Fallback("backend did not answer".into()));
        drop(sink);
        writer.await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "earlier line");
        assert!(lines[1].contains("[#3] Generating recommendation for:"));
        assert!(lines[1].contains("Fog"));
        assert!(lines[2].ends_with("Using fallback: backend did not answer"));
    }
}
