use std::time::Duration;

use async_trait::async_trait;

/// Represents an entity responsible for waiting between polling cycles. This allows tests to run
/// the polling loop without actually waiting.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    async fn sleep(&self, duration: Duration);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
