use async_trait::async_trait;
use reqwest::header::HeaderMap;

use std::fmt::Debug;
use std::time::Duration;

use crate::consts::RATE_LIMIT_RESET_HEADER;

/// Blocks the current request loop while waiting out a rate limit.
#[async_trait]
pub trait Sleeper: Debug + Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Seconds to wait before retrying: `max(reset_at - now, 1) + 1`.
pub fn rate_limit_wait(reset_at: i64, now: i64) -> Duration {
    let secs = reset_at.saturating_sub(now).max(1) + 1;
    Duration::from_secs(secs as u64)
}

/// Reset time from a 429 response. Missing or malformed headers read as 0.
pub(crate) fn rate_limit_reset(headers: &HeaderMap) -> i64 {
    headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0)
}
