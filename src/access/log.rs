use std::sync::{Arc, Mutex};

use super::patterns::AccessClassification;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedAccessEvent {
    pub path: String,
    pub matched_patterns: Vec<String>,
    pub excluded: bool,
    pub sequence_number: u64,
}

/// Destination for accesses the tracer decided to record.
///
/// `append` has no failure channel: recording is best-effort and must never
/// turn a successful open into an error.
pub trait AccessSink: Send + Sync {
    fn append(&self, access: AccessClassification);
}

impl<T: AccessSink + ?Sized> AccessSink for Arc<T> {
    fn append(&self, access: AccessClassification) {
        (**self).append(access);
    }
}

impl<T: AccessSink + ?Sized> AccessSink for &T {
    fn append(&self, access: AccessClassification) {
        (**self).append(access);
    }
}

/// Append-only, in-memory ordered log of recorded accesses.
///
/// Sequence numbers are assigned under the same lock as the push, so
/// concurrent appenders still observe a gap-free order that matches the log.
#[derive(Debug, Default)]
pub struct AccessLog {
    events: Mutex<Vec<TracedAccessEvent>>,
}

impl AccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<TracedAccessEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AccessSink for AccessLog {
    fn append(&self, access: AccessClassification) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let sequence_number = events.len() as u64;
        events.push(TracedAccessEvent {
            path: access.path,
            matched_patterns: access.matched_patterns,
            excluded: access.excluded,
            sequence_number,
        });
    }
}
