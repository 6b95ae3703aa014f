use async_trait::async_trait;

/// Alert dispatch capability.
///
/// Delivery is fire-and-forget: implementations report their own failures
/// and never hand them back to the caller.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, service: &str, message: &str);
}
