use super::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::ports::{AuditEvent, EventSinks, LogLevel};
use crate::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Retry configuration, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts; `0` still performs a single attempt
    pub max_retries: u32,
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after every failed attempt.
    ///
    /// The delay is never capped. Factors at or below `1.0` are legal and
    /// give a constant or shrinking delay.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Number of attempts `execute` will make
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        if self.max_retries == 0 {
            1
        } else {
            self.max_retries
        }
    }

    /// Delay slept after the given failed attempt (1-based)
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        (1..attempt).fold(self.initial_delay, |delay, _| {
            scale_delay(delay, self.backoff_factor)
        })
    }
}

/// Multiply a delay, saturating instead of panicking on overflow
fn scale_delay(delay: Duration, factor: f64) -> Duration {
    let scaled = delay.as_secs_f64() * factor;
    if scaled.is_nan() || scaled <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(scaled).unwrap_or(Duration::MAX)
}

/// Bounded-retry wrapper with exponential backoff.
///
/// Only transient errors are retried. A breaker, when supplied, receives
/// exactly one terminal report per `execute` call: `record_success` on the
/// first success, or `record_failure` once the retry budget is spent.
/// Non-retryable errors leave the breaker untouched.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sinks: EventSinks,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, sinks: EventSinks) -> Self {
        Self { policy, sinks }
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails permanently, or runs out of
    /// attempts. The final error is returned unchanged.
    pub async fn execute<T, F, Fut>(
        &self,
        service: &str,
        breaker: Option<&CircuitBreaker>,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.policy.attempts();
        let mut delay = self.policy.initial_delay;
        let mut attempt = 1;

        loop {
            debug!("Executing call to '{}' (attempt {})", service, attempt);

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Call to '{}' succeeded after {} attempts", service, attempt);
                    }
                    if let Some(breaker) = breaker {
                        breaker.record_success().await;
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let circuit_state = current_state(breaker).await;

            if !error.is_retryable() {
                warn!(
                    "Call to '{}' failed with non-retryable error: {}",
                    service, error
                );
                self.record(
                    LogLevel::Error,
                    service,
                    format!("Non-retryable failure: {error}"),
                    attempt,
                    circuit_state,
                );
                return Err(error);
            }

            if attempt >= attempts {
                error!(
                    "Call to '{}' failed after {} attempts: {}",
                    service, attempt, error
                );
                self.record(
                    LogLevel::Error,
                    service,
                    format!("All retries exhausted ({attempt}/{attempts}): {error}"),
                    attempt,
                    circuit_state,
                );
                if let Some(breaker) = breaker {
                    breaker.record_failure().await;
                }
                return Err(error);
            }

            warn!(
                "Call to '{}' failed (attempt {}/{}), retrying after {:?}: {}",
                service, attempt, attempts, delay, error
            );
            self.record(
                LogLevel::Warning,
                service,
                format!(
                    "Retry {attempt}/{attempts} failed: {error}. Retrying in {:.1}s",
                    delay.as_secs_f64()
                ),
                attempt,
                circuit_state,
            );

            sleep(delay).await;
            delay = scale_delay(delay, self.policy.backoff_factor);
            attempt += 1;
        }
    }

    fn record(
        &self,
        level: LogLevel,
        service: &str,
        message: String,
        attempt: u32,
        circuit_state: Option<CircuitState>,
    ) {
        let mut event = AuditEvent::new(level, service, message).with_retry_count(attempt);
        event.circuit_state = circuit_state;
        self.sinks.record(event);
    }
}

async fn current_state(breaker: Option<&CircuitBreaker>) -> Option<CircuitState> {
    match breaker {
        Some(breaker) => Some(breaker.state().await),
        None => None,
    }
}
