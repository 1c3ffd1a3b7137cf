//! Clock abstraction (epoch seconds).
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    async fn now_epoch_secs(&self) -> i64;
}
