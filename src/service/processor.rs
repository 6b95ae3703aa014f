use super::queue::{CallQueue, WorkItem};
use crate::ports::{AuditEvent, Dependency, EventSinks, LogLevel};
use crate::resilience::{CircuitBreaker, RetryExecutor};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

const SYSTEM_SERVICE: &str = "System";

pub const TRANSIENT_FAILURE_ALERT: &str = "Transient failure, retries exhausted";
pub const PERMANENT_FAILURE_ALERT: &str = "Permanent failure detected";

/// Result of processing one work item that did not halt the run
#[derive(Debug)]
pub enum CallOutcome {
    /// The dependency answered
    Completed { response_len: usize },
    /// The circuit refused the call; the dependency was not contacted
    Skipped,
    /// Transient failures used up the retry budget
    Failed(Error),
}

/// Tally of a queue run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: Vec<WorkItem>,
    pub failed: Vec<WorkItem>,
    pub skipped: Vec<WorkItem>,
    /// Item whose permanent failure stopped the run
    pub halted: Option<(WorkItem, Error)>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.succeeded.len()
            + self.failed.len()
            + self.skipped.len()
            + usize::from(self.halted.is_some())
    }

    pub const fn is_halted(&self) -> bool {
        self.halted.is_some()
    }
}

/// Drives work items through the breaker and the retry executor.
///
/// Per item: ask the breaker, call the dependency under retry, and report.
/// Exhausted transient failures are logged, alerted and passed over;
/// a permanent failure is logged, alerted and ends the run.
pub struct CallProcessor {
    dependency: Arc<dyn Dependency>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryExecutor,
    sinks: EventSinks,
}

impl CallProcessor {
    pub fn new(
        dependency: Arc<dyn Dependency>,
        breaker: Arc<CircuitBreaker>,
        retry: RetryExecutor,
        sinks: EventSinks,
    ) -> Self {
        Self {
            dependency,
            breaker,
            retry,
            sinks,
        }
    }

    pub const fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Process a single item. Only a permanent failure is returned as `Err`.
    #[instrument(skip(self), fields(service = %self.dependency.name()))]
    pub async fn process_item(&self, item: &WorkItem) -> Result<CallOutcome> {
        let service = self.dependency.name();
        self.sinks.record(AuditEvent::new(
            LogLevel::Info,
            SYSTEM_SERVICE,
            format!("Processing call for {item}"),
        ));

        if let Err(e) = self.breaker.check().await {
            warn!("{}; skipping {}", e, item);
            self.sinks.record(
                AuditEvent::new(LogLevel::Warning, service, "Circuit OPEN. Skipping call.")
                    .with_circuit_state(self.breaker.state().await),
            );
            return Ok(CallOutcome::Skipped);
        }

        let payload = format!("Hello {item}");
        let result = self
            .retry
            .execute(service, Some(&self.breaker), || {
                self.dependency.invoke(&payload)
            })
            .await;
        let circuit_state = self.breaker.state().await;

        match result {
            Ok(response) => {
                info!("Call for {} completed", item);
                self.sinks.record(
                    AuditEvent::new(LogLevel::Info, service, format!("Call successful for {item}"))
                        .with_circuit_state(circuit_state),
                );
                Ok(CallOutcome::Completed {
                    response_len: response.len(),
                })
            }
            Err(e) if e.is_retryable() => {
                error!("Call for {} failed after retries: {}", item, e);
                self.sinks.record(
                    AuditEvent::new(LogLevel::Error, service, e.to_string())
                        .with_retry_count(self.retry.policy().max_retries)
                        .with_circuit_state(circuit_state),
                );
                self.sinks.notify(service, TRANSIENT_FAILURE_ALERT).await;
                Ok(CallOutcome::Failed(e))
            }
            Err(e) => {
                error!("Call for {} failed permanently: {}", item, e);
                self.sinks.record(
                    AuditEvent::new(LogLevel::Critical, service, e.to_string())
                        .with_circuit_state(circuit_state),
                );
                self.sinks.notify(service, PERMANENT_FAILURE_ALERT).await;
                Err(e)
            }
        }
    }

    /// Drain the queue, stopping early on a permanent failure. Items left
    /// behind by a halt stay in the queue.
    pub async fn run(&self, queue: &mut CallQueue) -> RunSummary {
        let mut summary = RunSummary::default();

        while let Some(item) = queue.next_call() {
            match self.process_item(&item).await {
                Ok(CallOutcome::Completed { .. }) => summary.succeeded.push(item),
                Ok(CallOutcome::Failed(_)) => summary.failed.push(item),
                Ok(CallOutcome::Skipped) => summary.skipped.push(item),
                Err(e) => {
                    warn!(
                        "Halting run after permanent failure; {} item(s) left in queue",
                        queue.len()
                    );
                    summary.halted = Some((item, e));
                    break;
                }
            }
        }

        summary
    }
}

impl std::fmt::Debug for CallProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallProcessor")
            .field("dependency", &self.dependency.name())
            .field("breaker", &self.breaker)
            .field("retry", &self.retry.policy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{recording_sinks, RecordingAlertSink, RecordingAuditSink};
    use crate::adapters::{FailureKind, MockTtsService};
    use crate::resilience::{CircuitBreakerConfig, CircuitState, RetryPolicy};
    use std::time::Duration;

    struct Harness {
        processor: CallProcessor,
        service: Arc<MockTtsService>,
        audit: Arc<RecordingAuditSink>,
        alerts: Arc<RecordingAlertSink>,
    }

    fn harness(service: MockTtsService, max_retries: u32, threshold: u32) -> Harness {
        let (sinks, audit, alerts) = recording_sinks();
        let service = Arc::new(service);
        let breaker = Arc::new(CircuitBreaker::new(
            "ElevenLabs",
            CircuitBreakerConfig {
                failure_threshold: threshold,
                recovery_timeout: Duration::from_secs(10),
            },
            sinks.clone(),
        ));
        let retry = RetryExecutor::new(
            RetryPolicy {
                max_retries,
                initial_delay: Duration::from_secs(5),
                backoff_factor: 2.0,
            },
            sinks.clone(),
        );
        Harness {
            processor: CallProcessor::new(service.clone(), breaker, retry, sinks),
            service,
            audit,
            alerts,
        }
    }

    #[tokio::test]
    async fn test_successful_call() {
        let h = harness(
            MockTtsService::new("ElevenLabs").with_fail_mode(false),
            3,
            2,
        );

        let outcome = h
            .processor
            .process_item(&WorkItem::from("Contact-1"))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            CallOutcome::Completed { response_len } if response_len > 0
        ));
        assert!(h
            .audit
            .messages()
            .contains(&"Call successful for Contact-1".to_string()));
        assert!(h.alerts.alerts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_exhaustion_alerts_and_continues() {
        let h = harness(
            MockTtsService::new("ElevenLabs").with_forced_error(Some(FailureKind::Server)),
            2,
            5,
        );

        let outcome = h
            .processor
            .process_item(&WorkItem::from("Contact-1"))
            .await
            .unwrap();

        assert!(matches!(outcome, CallOutcome::Failed(Error::Transient { .. })));
        assert_eq!(h.service.calls(), 2);
        assert_eq!(
            h.alerts.alerts(),
            vec![(
                "ElevenLabs".to_string(),
                TRANSIENT_FAILURE_ALERT.to_string()
            )]
        );
        let last = h.audit.events().pop().unwrap();
        assert_eq!(last.level, LogLevel::Error);
        assert_eq!(last.retry_count, Some(2));
        assert_eq!(last.circuit_state, Some(CircuitState::Closed));
    }

    #[tokio::test]
    async fn test_permanent_failure_is_returned() {
        let h = harness(
            MockTtsService::new("ElevenLabs").with_forced_error(Some(FailureKind::Auth)),
            3,
            2,
        );

        let result = h.processor.process_item(&WorkItem::from("Contact-1")).await;

        assert!(matches!(result, Err(Error::Permanent { .. })));
        assert_eq!(h.service.calls(), 1);
        assert_eq!(h.processor.breaker().snapshot().await.failure_count, 0);
        assert!(h
            .alerts
            .alerts()
            .iter()
            .any(|(_, message)| message == PERMANENT_FAILURE_ALERT));
    }

    #[tokio::test]
    async fn test_run_halts_on_permanent_failure() {
        let h = harness(
            MockTtsService::new("ElevenLabs").with_forced_error(Some(FailureKind::Auth)),
            3,
            2,
        );
        let mut queue = CallQueue::new(["A", "B", "C"], h.audit.clone());

        let summary = h.processor.run(&mut queue).await;

        assert!(summary.is_halted());
        assert_eq!(summary.processed(), 1);
        let (item, error) = summary.halted.unwrap();
        assert_eq!(item, WorkItem::from("A"));
        assert!(matches!(error, Error::Permanent { .. }));
        assert_eq!(
            queue.remaining(),
            vec![WorkItem::from("B"), WorkItem::from("C")]
        );
    }
}
