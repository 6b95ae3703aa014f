use crate::ports::{AuditEvent, EventSinks, LogLevel};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Alert raised when the breaker trips
pub const CIRCUIT_OPEN_ALERT: &str = "Circuit breaker OPEN — service unhealthy";

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Circuit is closed - requests flow normally
    Closed,
    /// Circuit is open - requests are rejected until the recovery timeout
    Open,
    /// Circuit is half-open - a probe call is testing recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        };
        f.write_str(label)
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Failure count that opens the circuit
    pub failure_threshold: u32,
    /// Time to wait after the last failure before probing again
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            recovery_timeout: Duration::from_secs(10),
        }
    }
}

/// Mutable breaker fields, always updated together under one lock
#[derive(Debug, Clone)]
struct CircuitInner {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

impl Default for CircuitInner {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_time: None,
        }
    }
}

/// Tri-state health gate for a single dependency.
///
/// Shared between the call path and the health monitor, so every transition
/// happens inside a single write lock. Audit records and alerts are emitted
/// after the lock is released.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: RwLock<CircuitInner>,
    sinks: EventSinks,
}

impl CircuitBreaker {
    /// Create a new circuit breaker in the `Closed` state
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig, sinks: EventSinks) -> Self {
        Self {
            name: name.into(),
            config,
            inner: RwLock::new(CircuitInner::default()),
            sinks,
        }
    }

    /// Name of the guarded service
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Ask whether a call may go through.
    ///
    /// `Closed` and `HalfOpen` always admit. `Open` admits only once the
    /// recovery timeout has elapsed since the last failure, switching to
    /// `HalfOpen` as it does; before that it rejects without side effects.
    pub async fn allow_request(&self) -> bool {
        {
            let mut inner = self.inner.write().await;

            match inner.state {
                CircuitState::Closed | CircuitState::HalfOpen => return true,
                CircuitState::Open => {
                    let recovered = inner
                        .last_failure_time
                        .map_or(true, |at| at.elapsed() >= self.config.recovery_timeout);
                    if !recovered {
                        debug!("Circuit breaker '{}': rejecting request", self.name);
                        return false;
                    }
                    inner.state = CircuitState::HalfOpen;
                }
            }
        }

        info!(
            "Circuit breaker '{}': Transitioning from Open to Half-Open",
            self.name
        );
        self.sinks.record(
            AuditEvent::new(
                LogLevel::Info,
                &self.name,
                "Circuit breaker HALF_OPEN: testing service",
            )
            .with_circuit_state(CircuitState::HalfOpen),
        );
        true
    }

    /// [`allow_request`](Self::allow_request) as a `Result`
    pub async fn check(&self) -> Result<()> {
        if self.allow_request().await {
            Ok(())
        } else {
            Err(Error::CircuitBreakerOpen {
                service: self.name.clone(),
            })
        }
    }

    /// Report a successful call, closing the circuit if it was not closed
    pub async fn record_success(&self) {
        let previous = {
            let mut inner = self.inner.write().await;
            let previous = inner.state;
            inner.failure_count = 0;
            inner.state = CircuitState::Closed;
            previous
        };

        if previous != CircuitState::Closed {
            info!(
                "Circuit breaker '{}': Transitioning from {} to Closed",
                self.name, previous
            );
            self.sinks.record(
                AuditEvent::new(
                    LogLevel::Info,
                    &self.name,
                    "Circuit breaker CLOSED: service recovered",
                )
                .with_circuit_state(CircuitState::Closed),
            );
        }
    }

    /// Report a failed call.
    ///
    /// Every failure refreshes `last_failure_time`, so a failed half-open
    /// probe restarts the recovery window.
    pub async fn record_failure(&self) {
        let (failure_count, previous, opened) = {
            let mut inner = self.inner.write().await;
            inner.failure_count = inner.failure_count.saturating_add(1);
            inner.last_failure_time = Some(Instant::now());

            let previous = inner.state;
            let opened = inner.failure_count >= self.config.failure_threshold
                && previous != CircuitState::Open;
            if opened {
                inner.state = CircuitState::Open;
            }
            (inner.failure_count, previous, opened)
        };

        warn!(
            "Circuit breaker '{}': Failure recorded ({}/{})",
            self.name, failure_count, self.config.failure_threshold
        );
        self.sinks.record(
            AuditEvent::new(
                LogLevel::Warning,
                &self.name,
                format!(
                    "Failure recorded ({}/{})",
                    failure_count, self.config.failure_threshold
                ),
            )
            .with_circuit_state(previous),
        );

        if opened {
            error!(
                "Circuit breaker '{}': Opening due to {} failures",
                self.name, failure_count
            );
            self.sinks.record(
                AuditEvent::new(
                    LogLevel::Critical,
                    &self.name,
                    "Circuit breaker OPEN: service marked unhealthy",
                )
                .with_circuit_state(CircuitState::Open),
            );
            self.sinks.notify(&self.name, CIRCUIT_OPEN_ALERT).await;
        }
    }

    /// Get current circuit breaker state
    pub async fn state(&self) -> CircuitState {
        self.inner.read().await.state
    }

    /// Point-in-time copy of the breaker's counters
    pub async fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.inner.read().await;

        CircuitSnapshot {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            failure_threshold: self.config.failure_threshold,
            last_failure_time: inner.last_failure_time,
        }
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Public view of circuit breaker state
#[derive(Debug, Clone)]
pub struct CircuitSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub last_failure_time: Option<Instant>,
}

impl CircuitSnapshot {
    /// Check if circuit breaker is healthy
    pub const fn is_healthy(&self) -> bool {
        matches!(self.state, CircuitState::Closed)
    }
}
