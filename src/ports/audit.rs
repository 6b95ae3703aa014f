use crate::resilience::CircuitState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// One structured audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub service: String,
    pub message: String,
    pub retry_count: Option<u32>,
    pub circuit_state: Option<CircuitState>,
}

impl AuditEvent {
    /// Create an event stamped with the current UTC time
    pub fn new(level: LogLevel, service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            service: service.into(),
            message: message.into(),
            retry_count: None,
            circuit_state: None,
        }
    }

    #[must_use]
    pub const fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    #[must_use]
    pub const fn with_circuit_state(mut self, state: CircuitState) -> Self {
        self.circuit_state = Some(state);
        self
    }
}

/// Structured audit capability.
///
/// Recording never fails from the caller's point of view; sinks log their
/// own I/O problems.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = AuditEvent::new(LogLevel::Warning, "ElevenLabs", "Retry 1/3 failed")
            .with_retry_count(1)
            .with_circuit_state(CircuitState::Closed);

        assert_eq!(event.level, LogLevel::Warning);
        assert_eq!(event.service, "ElevenLabs");
        assert_eq!(event.retry_count, Some(1));
        assert_eq!(event.circuit_state, Some(CircuitState::Closed));
    }

    #[test]
    fn test_event_serializes_with_upper_case_tags() {
        let event = AuditEvent::new(LogLevel::Critical, "svc", "down")
            .with_circuit_state(CircuitState::HalfOpen);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["level"], "CRITICAL");
        assert_eq!(json["circuit_state"], "HALF_OPEN");
        assert!(json["retry_count"].is_null());
    }

    #[test]
    fn test_level_display() {
        assert_eq!(LogLevel::Info.to_string(), "INFO");
        assert_eq!(LogLevel::Warning.to_string(), "WARNING");
        assert!(LogLevel::Critical > LogLevel::Error);
    }
}
