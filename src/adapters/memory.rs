//! In-memory sinks that keep everything they receive.
//!
//! Used by tests and by embedders that want to inspect the audit trail.

use crate::ports::{AlertSink, AuditEvent, AuditSink, EventSinks, LogLevel};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Audit sink collecting events in order
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        lock(&self.events).clone()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .map(|event| event.message.clone())
            .collect()
    }

    pub fn count_at(&self, level: LogLevel) -> usize {
        lock(&self.events)
            .iter()
            .filter(|event| event.level == level)
            .count()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &AuditEvent) {
        lock(&self.events).push(event.clone());
    }
}

/// Alert sink collecting `(service, message)` pairs in order
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<(String, String)>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<(String, String)> {
        lock(&self.alerts).clone()
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn notify(&self, service: &str, message: &str) {
        lock(&self.alerts).push((service.to_string(), message.to_string()));
    }
}

/// Event sinks backed by fresh recorders, plus handles to inspect them
pub fn recording_sinks() -> (EventSinks, Arc<RecordingAuditSink>, Arc<RecordingAlertSink>) {
    let audit = Arc::new(RecordingAuditSink::new());
    let alerts = Arc::new(RecordingAlertSink::new());
    let sinks = EventSinks::new(audit.clone(), alerts.clone());
    (sinks, audit, alerts)
}
