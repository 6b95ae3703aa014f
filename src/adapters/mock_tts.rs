use crate::ports::{Dependency, HealthProbe};
use crate::{Error, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;
use tracing::debug;

/// Payload that always fails with an authentication error
pub const PERMANENT_FAIL: &str = "PERMANENT_FAIL";

/// Failure modes the mock can simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FailureKind {
    /// Request timeout (transient)
    Timeout,
    /// 503 Service Unavailable (transient)
    Server,
    /// Authentication failure (permanent)
    Auth,
}

impl FailureKind {
    const ALL: [Self; 3] = [Self::Timeout, Self::Server, Self::Auth];

    fn into_error(self, service: &str) -> Error {
        match self {
            Self::Timeout => Error::transient(service, format!("{service} timeout occurred")),
            Self::Server => {
                Error::transient(service, format!("{service} 503 Service Unavailable"))
            }
            Self::Auth => Error::permanent(service, format!("{service} authentication failed")),
        }
    }
}

/// Simulated text-to-speech dependency.
///
/// Starts in fail mode. While failing, each call picks a failure at random
/// unless one is forced. Reports itself healthy exactly when not failing.
#[derive(Debug)]
pub struct MockTtsService {
    name: String,
    fail_mode: AtomicBool,
    forced_error: RwLock<Option<FailureKind>>,
    calls: AtomicU32,
}

impl MockTtsService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_mode: AtomicBool::new(true),
            forced_error: RwLock::new(None),
            calls: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn with_forced_error(self, kind: Option<FailureKind>) -> Self {
        self.force_error(kind);
        self
    }

    #[must_use]
    pub fn with_fail_mode(self, failing: bool) -> Self {
        self.set_fail_mode(failing);
        self
    }

    pub fn set_fail_mode(&self, failing: bool) {
        self.fail_mode.store(failing, Ordering::SeqCst);
    }

    pub fn is_failing(&self) -> bool {
        self.fail_mode.load(Ordering::SeqCst)
    }

    pub fn force_error(&self, kind: Option<FailureKind>) {
        *self
            .forced_error
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = kind;
    }

    /// Number of `invoke` calls so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn pick_failure(&self) -> FailureKind {
        let forced = *self
            .forced_error
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        forced.unwrap_or_else(|| {
            *FailureKind::ALL
                .choose(&mut rand::thread_rng())
                .unwrap_or(&FailureKind::Timeout)
        })
    }
}

#[async_trait]
impl Dependency for MockTtsService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, payload: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if payload == PERMANENT_FAIL {
            return Err(FailureKind::Auth.into_error(&self.name));
        }

        if self.is_failing() {
            return Err(self.pick_failure().into_error(&self.name));
        }

        debug!("{} generated speech for {:?}", self.name, payload);
        Ok(format!("audio({payload})").into_bytes())
    }
}

#[async_trait]
impl HealthProbe for MockTtsService {
    async fn is_healthy(&self) -> bool {
        !self.is_failing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[tokio::test]
    async fn test_starts_failing_and_unhealthy() {
        let service = MockTtsService::new("ElevenLabs");
        assert!(service.is_failing());
        assert!(!service.is_healthy().await);

        let err = service.invoke("Hello Contact-1").await.unwrap_err();
        assert_eq!(err.service(), Some("ElevenLabs"));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_forced_errors_are_classified() {
        let service = MockTtsService::new("ElevenLabs");

        service.force_error(Some(FailureKind::Timeout));
        let err = service.invoke("hi").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Transient);
        assert_eq!(
            err.to_string(),
            "Transient failure from ElevenLabs: ElevenLabs timeout occurred"
        );

        service.force_error(Some(FailureKind::Server));
        let err = service.invoke("hi").await.unwrap_err();
        assert!(err.is_retryable());

        service.force_error(Some(FailureKind::Auth));
        let err = service.invoke("hi").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Permanent);
    }

    #[tokio::test]
    async fn test_healthy_service_returns_audio() {
        let service = MockTtsService::new("ElevenLabs").with_fail_mode(false);
        assert!(service.is_healthy().await);

        let audio = service.invoke("Hello Contact-1").await.unwrap();
        assert_eq!(audio, b"audio(Hello Contact-1)".to_vec());
    }

    #[tokio::test]
    async fn test_permanent_fail_payload_ignores_fail_mode() {
        let service = MockTtsService::new("ElevenLabs").with_fail_mode(false);

        let err = service.invoke(PERMANENT_FAIL).await.unwrap_err();
        assert!(matches!(err, Error::Permanent { .. }));
    }
}
