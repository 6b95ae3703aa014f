//! # Adapters Module
//!
//! Concrete implementations of the capability contracts in [`crate::ports`].
//!
//! - [`MockTtsService`]: simulated speech dependency (also its health probe)
//! - [`AlertManager`]: email / Telegram / webhook alert fan-out
//! - [`TracingAuditSink`], [`JsonLinesAuditSink`], [`CsvAuditSink`],
//!   [`FanoutAuditSink`]: audit trail writers
//! - [`memory`]: recorders for tests and inspection

pub mod alert_manager;
pub mod audit_log;
pub mod memory;
pub mod mock_tts;

// Re-export adapters for convenience
pub use alert_manager::{AlertManager, LogAlertSink};
pub use audit_log::{CsvAuditSink, FanoutAuditSink, JsonLinesAuditSink, TracingAuditSink};
pub use memory::{recording_sinks, RecordingAlertSink, RecordingAuditSink};
pub use mock_tts::{FailureKind, MockTtsService, PERMANENT_FAIL};
