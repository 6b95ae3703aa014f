pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;
pub mod resilience;
pub mod service;

pub use adapters::{AlertManager, MockTtsService};
pub use config::Config;
pub use error::{Error, ErrorCategory, Result};
pub use ports::{AlertSink, AuditEvent, AuditSink, Dependency, EventSinks, HealthProbe, LogLevel};
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, HealthMonitor, HealthMonitorConfig,
    RetryExecutor, RetryPolicy,
};
pub use service::{CallProcessor, CallQueue, RunSummary, SignalHandler, WorkItem};
