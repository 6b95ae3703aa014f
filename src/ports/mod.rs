//! # Ports Module
//!
//! Capability contracts the resilience core consumes. The core only ever talks
//! to these traits; concrete implementations live in [`crate::adapters`].
//!
//! - [`Dependency`]: the unreliable remote call, failing with a classified
//!   [`crate::Error`]
//! - [`HealthProbe`]: the dependency's live health flag
//! - [`AlertSink`]: fire-and-forget `notify(service, message)`
//! - [`AuditSink`]: structured `record(level, service, message, ...)`
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use resilient_call_agent::ports::{AuditEvent, EventSinks, LogLevel};
//!
//! let sinks = EventSinks::tracing_only();
//! sinks.record(AuditEvent::new(LogLevel::Info, "System", "starting"));
//! ```

pub mod alerting;
pub mod audit;
pub mod dependency;

pub use alerting::AlertSink;
pub use audit::{AuditEvent, AuditSink, LogLevel};
pub use dependency::{Dependency, HealthProbe};

use std::sync::Arc;

/// The two outbound event channels shared by every component
#[derive(Clone)]
pub struct EventSinks {
    pub audit: Arc<dyn AuditSink>,
    pub alerts: Arc<dyn AlertSink>,
}

impl EventSinks {
    pub fn new(audit: Arc<dyn AuditSink>, alerts: Arc<dyn AlertSink>) -> Self {
        Self { audit, alerts }
    }

    /// Sinks that only write to `tracing`; alerts are logged, not delivered
    #[must_use]
    pub fn tracing_only() -> Self {
        Self {
            audit: Arc::new(crate::adapters::TracingAuditSink),
            alerts: Arc::new(crate::adapters::LogAlertSink),
        }
    }

    /// Record an audit event
    pub fn record(&self, event: AuditEvent) {
        self.audit.record(&event);
    }

    /// Raise an alert
    pub async fn notify(&self, service: &str, message: &str) {
        self.alerts.notify(service, message).await;
    }
}

impl std::fmt::Debug for EventSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSinks").finish_non_exhaustive()
    }
}
