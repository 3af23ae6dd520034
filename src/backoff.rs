use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::{BackoffStrategy, RetryOptions, Retryable, RETRY_TIMES, RETRY_WAIT};

/// Drives repeated invocation of an attempt under a backoff policy.
///
/// `run` calls `attempt` until it returns `Ok(())` or the policy gives up,
/// in which case the last [`Retryable`] is returned. Waiting between attempts
/// is entirely the retrier's business.
#[async_trait]
pub trait Retrier: Send + Sync {
    async fn run<F, Fut>(&self, attempt: F) -> Result<(), Retryable>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<(), Retryable>> + Send;
}

/// Built-in retrier with a constant or exponential delay schedule.
///
/// `max_retries` counts retries after the initial attempt: the attempt runs
/// at most `max_retries + 1` times.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Backoff {
    strategy: BackoffStrategy,
    max_retries: usize,
    wait: Duration,
    max_wait: Option<Duration>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::constant(RETRY_TIMES, RETRY_WAIT)
    }
}

impl Backoff {
    /// Waits `wait` before every retry.
    pub fn constant(max_retries: usize, wait: Duration) -> Self {
        Self {
            strategy: BackoffStrategy::Constant,
            max_retries,
            wait,
            max_wait: None,
        }
    }

    /// Waits `initial`, then twice as long before each following retry.
    ///
    /// Doubling stops after the 16th retry; later retries keep waiting
    /// `initial * 2^16` unless [`with_max_wait`](Self::with_max_wait) caps
    /// the wait lower.
    pub fn exponential(max_retries: usize, initial: Duration) -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            max_retries,
            wait: initial,
            max_wait: None,
        }
    }

    /// Never retries.
    pub fn none() -> Self {
        Self::constant(0, Duration::ZERO)
    }

    /// Caps every single wait at `max_wait`.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Wait before retry number `retry` (0-based). The exponential schedule
    /// stops doubling at `retry == 16`.
    pub fn delay(&self, retry: usize) -> Duration {
        let delay = match self.strategy {
            BackoffStrategy::Constant => self.wait,
            BackoffStrategy::Exponential => {
                let exp = retry.min(16) as u32;
                self.wait.saturating_mul(1u32 << exp)
            }
        };
        match self.max_wait {
            Some(max_wait) => delay.min(max_wait),
            None => delay,
        }
    }
}

impl From<RetryOptions> for Backoff {
    fn from(options: RetryOptions) -> Self {
        let backoff = match options.strategy {
            BackoffStrategy::Constant => Self::constant(options.max_retries, options.wait()),
            BackoffStrategy::Exponential => {
                Self::exponential(options.max_retries, options.wait())
            }
        };
        match options.max_wait() {
            Some(max_wait) => backoff.with_max_wait(max_wait),
            None => backoff,
        }
    }
}

#[async_trait]
impl Retrier for Backoff {
    async fn run<F, Fut>(&self, mut attempt: F) -> Result<(), Retryable>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<(), Retryable>> + Send,
    {
        let mut retries = 0usize;
        loop {
            let reason = match attempt().await {
                Ok(()) => return Ok(()),
                Err(reason) => reason,
            };
            if retries >= self.max_retries {
                return Err(reason);
            }

            let delay = self.delay(retries);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                "{reason}; retry {} of {} after {} ms",
                retries + 1,
                self.max_retries,
                delay.as_millis()
            );

            sleep(delay).await;
            retries += 1;
        }
    }
}
