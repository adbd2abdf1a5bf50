//! Progress sinks: where run messages go.
//!
//! The orchestrator only needs `notify` and `clear` to appear atomic and
//! ordered from its side. Implementations do their own synchronization and
//! must tolerate being called from a tokio worker thread other than the one
//! reading the log.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::SinkError;

pub trait ProgressSink: Send + Sync {
    /// Append one line to the visible log.
    ///
    /// # Errors
    ///
    /// A failed delivery ends the current run as `Failed`.
    fn notify(&self, message: &str) -> Result<(), SinkError>;

    /// Reset the visible log. Called once before a run emits anything.
    ///
    /// # Errors
    ///
    /// A failed clear prevents the run from starting.
    fn clear(&self) -> Result<(), SinkError>;
}

/// In-memory log shared between the orchestrator and a reader.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<String>>, SinkError> {
        self.lines.lock().map_err(|_| SinkError::Poisoned)
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.guard().map(|lines| lines.clone()).unwrap_or_default()
    }

    /// The log as one newline-joined string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.guard().map(|lines| lines.len()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressSink for LogBuffer {
    fn notify(&self, message: &str) -> Result<(), SinkError> {
        self.guard()?.push(message.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SinkError> {
        self.guard()?.clear();
        Ok(())
    }
}

/// Forwards progress lines to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn notify(&self, message: &str) -> Result<(), SinkError> {
        tracing::info!(target: "qconsole::progress", "{}", message.trim_start_matches('\n'));
        Ok(())
    }

    fn clear(&self) -> Result<(), SinkError> {
        tracing::debug!(target: "qconsole::progress", "log reset");
        Ok(())
    }
}

/// Wraps a caller's sink and records what was actually delivered, so a run
/// can report its emitted messages even when its task dies.
pub(crate) struct RecordingSink {
    inner: Arc<dyn ProgressSink>,
    delivered: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub(crate) fn new(inner: Arc<dyn ProgressSink>) -> Self {
        Self {
            inner,
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn delivered(&self) -> Vec<String> {
        self.delivered
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Whether this recorder forwards to the same sink object as `other`.
    pub(crate) fn shares_target(&self, other: &Arc<dyn ProgressSink>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(other))
    }

    pub(crate) fn delivered_count(&self) -> usize {
        self.delivered.lock().map(|lines| lines.len()).unwrap_or_default()
    }
}

impl ProgressSink for RecordingSink {
    fn notify(&self, message: &str) -> Result<(), SinkError> {
        self.inner.notify(message)?;
        self.delivered
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(message.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SinkError> {
        self.inner.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_buffer_appends_in_call_order() {
        let log = LogBuffer::new();
        log.notify("one").unwrap();
        log.notify("two").unwrap();
        assert_eq!(log.lines(), vec!["one", "two"]);
        assert_eq!(log.text(), "one\ntwo");
    }

    #[test]
    fn log_buffer_clones_share_state() {
        let log = LogBuffer::new();
        let reader = log.clone();
        log.notify("line").unwrap();
        assert_eq!(reader.len(), 1);
        log.clear().unwrap();
        assert!(reader.is_empty());
    }

    #[test]
    fn recording_sink_tracks_successful_deliveries() {
        let log = LogBuffer::new();
        let recording = RecordingSink::new(Arc::new(log.clone()));
        recording.notify("a").unwrap();
        recording.notify("b").unwrap();
        assert_eq!(recording.delivered(), vec!["a", "b"]);
        assert_eq!(recording.delivered_count(), 2);
        assert_eq!(log.lines(), vec!["a", "b"]);
    }

    #[test]
    fn recording_sink_knows_its_target() {
        let target: Arc<dyn ProgressSink> = Arc::new(LogBuffer::new());
        let other: Arc<dyn ProgressSink> = Arc::new(LogBuffer::new());
        let recording = RecordingSink::new(Arc::clone(&target));
        assert!(recording.shares_target(&target));
        assert!(!recording.shares_target(&other));
    }
}
