pub mod processor;
pub mod queue;
pub mod signals;

pub use processor::{
    CallOutcome, CallProcessor, RunSummary, PERMANENT_FAILURE_ALERT, TRANSIENT_FAILURE_ALERT,
};
pub use queue::{CallQueue, WorkItem};
pub use signals::SignalHandler;

use crate::adapters::{AlertManager, CsvAuditSink, FanoutAuditSink, JsonLinesAuditSink, TracingAuditSink};
use crate::config::Config;
use crate::ports::{AuditSink, EventSinks};
use crate::Result;
use std::sync::Arc;

/// Build the audit fan-out and alert manager described by `config`
pub fn build_event_sinks(config: &Config) -> Result<EventSinks> {
    let mut fanout = FanoutAuditSink::new().with(Arc::new(TracingAuditSink));

    if let Some(path) = &config.logging.log_file {
        fanout = fanout.with(Arc::new(JsonLinesAuditSink::open(path)?));
    }
    if let Some(path) = &config.logging.csv_file {
        fanout = fanout.with(Arc::new(CsvAuditSink::open(path)?));
    }

    let audit: Arc<dyn AuditSink> = Arc::new(fanout);
    let alerts = Arc::new(AlertManager::new(&config.alerts, audit.clone())?);
    Ok(EventSinks::new(audit, alerts))
}
