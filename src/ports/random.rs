//! Randomness abstraction so backoff jitter stays deterministic in tests.
#[async_trait::async_trait]
pub trait RandomSource: Send + Sync {
    async fn next_f64(&self) -> f64;
}
