use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type BackoffFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

// 2^6 倍之後不再成長
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// 重試策略：最多嘗試幾次，以及第 n 次失敗後 (n 從 0 起算) 要等多久
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: BackoffFn,
}

impl RetryPolicy {
    pub fn with_backoff<F>(max_attempts: u32, backoff: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(backoff),
        }
    }

    /// base * 2^attempt
    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self::with_backoff(max_attempts, move |attempt| exponential_delay(base, attempt))
    }

    /// 不等待，測試用
    pub fn immediate(max_attempts: u32) -> Self {
        Self::with_backoff(max_attempts, |_| Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }

    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts).map(|attempt| self.delay_for(attempt)).collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_secs(1))
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("schedule", &self.schedule())
            .finish()
    }
}

pub fn exponential_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1 << attempt.min(MAX_BACKOFF_EXPONENT))
}
