use crate::Result;
use async_trait::async_trait;

/// The remote dependency guarded by the resilience core.
///
/// Failures must be classified: [`crate::Error::Transient`] for timeouts and
/// temporary unavailability, [`crate::Error::Permanent`] for authentication
/// or malformed requests.
#[async_trait]
pub trait Dependency: Send + Sync {
    /// Name used in logs, alerts and error values
    fn name(&self) -> &str;

    /// Perform one call
    async fn invoke(&self, payload: &str) -> Result<Vec<u8>>;
}

/// Live health flag of a dependency, sampled by the health monitor
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn is_healthy(&self) -> bool;
}
