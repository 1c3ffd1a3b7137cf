//! `Clock` implementation backed by `SystemTime`.
use crate::infra::time::now_epoch_secs;
use crate::ports::clock::Clock;

#[derive(Default)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    async fn now_epoch_secs(&self) -> i64 {
        now_epoch_secs()
    }
}
