use proptest::prelude::*;
use resilient_call_agent::adapters::recording_sinks;
use resilient_call_agent::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, Error, RetryExecutor, RetryPolicy,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

/// Property-based tests for the breaker state machine
mod circuit_breaker_props {
    use super::*;

    proptest! {
        #[test]
        fn test_opens_exactly_at_threshold(threshold in 1u32..20) {
            let rt = paused_runtime();
            rt.block_on(async {
                let (sinks, _, alerts) = recording_sinks();
                let breaker = CircuitBreaker::new(
                    "svc",
                    CircuitBreakerConfig {
                        failure_threshold: threshold,
                        recovery_timeout: Duration::from_secs(10),
                    },
                    sinks,
                );

                for _ in 1..threshold {
                    breaker.record_failure().await;
                }
                assert_eq!(breaker.state().await, CircuitState::Closed);
                assert!(breaker.allow_request().await);

                breaker.record_failure().await;
                assert_eq!(breaker.state().await, CircuitState::Open);
                assert!(!breaker.allow_request().await);
                assert_eq!(alerts.alerts().len(), 1);
            });
        }

        #[test]
        fn test_success_always_resets(threshold in 1u32..10, failures in 0u32..20) {
            let rt = paused_runtime();
            rt.block_on(async {
                let (sinks, _, _) = recording_sinks();
                let breaker = CircuitBreaker::new(
                    "svc",
                    CircuitBreakerConfig {
                        failure_threshold: threshold,
                        recovery_timeout: Duration::from_secs(10),
                    },
                    sinks,
                );

                for _ in 0..failures {
                    breaker.record_failure().await;
                }
                let snapshot = breaker.snapshot().await;
                assert_eq!(snapshot.failure_count, failures);
                assert_eq!(snapshot.state == CircuitState::Open, failures >= threshold);

                breaker.record_success().await;
                let snapshot = breaker.snapshot().await;
                assert_eq!(snapshot.state, CircuitState::Closed);
                assert_eq!(snapshot.failure_count, 0);
            });
        }
    }
}

/// Property-based tests for the retry schedule
mod retry_props {
    use super::*;

    proptest! {
        #[test]
        fn test_attempts_bounded_by_policy(max_retries in 0u32..8) {
            let rt = paused_runtime();
            rt.block_on(async {
                let (sinks, audit, _) = recording_sinks();
                let executor = RetryExecutor::new(
                    RetryPolicy {
                        max_retries,
                        initial_delay: Duration::from_millis(100),
                        backoff_factor: 2.0,
                    },
                    sinks,
                );
                let calls = AtomicU32::new(0);

                let result: Result<(), Error> = executor
                    .execute("svc", None, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async { Err(Error::transient("svc", "timeout")) }
                    })
                    .await;

                assert!(result.is_err());
                assert_eq!(calls.load(Ordering::SeqCst), max_retries.max(1));
                assert_eq!(audit.events().len() as u32, max_retries.max(1));
            });
        }

        #[test]
        fn test_delay_schedule_is_geometric(
            initial_ms in 1u64..10_000,
            factor in 1.0f64..4.0,
            attempt in 1u32..8,
        ) {
            let policy = RetryPolicy {
                max_retries: 10,
                initial_delay: Duration::from_millis(initial_ms),
                backoff_factor: factor,
            };

            let expected = initial_ms as f64 / 1000.0 * factor.powi(attempt as i32 - 1);
            let actual = policy.delay_after(attempt).as_secs_f64();
            prop_assert!((actual - expected).abs() <= expected * 1e-5 + 1e-6);
            prop_assert!(policy.delay_after(attempt + 1) >= policy.delay_after(attempt));
        }
    }
}
