//! Fixed-interval retry policy for the completion endpoint.

use std::future::Future;
use std::time::Duration;

use super::client::LlmError;

/// How the completion client reacts to transient endpoint failures.
///
/// Each transient failure is logged, followed by a sleep of `backoff`, and
/// the identical request is issued again. There is no exponential growth.
/// With `max_attempts = None` the loop never gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub backoff: Duration,
    /// Total attempts allowed, including the first. `None` = unlimited.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Pause used when nothing else is configured.
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(30);

    /// Retry forever with the given pause.
    pub fn unbounded(backoff: Duration) -> Self {
        Self {
            backoff,
            max_attempts: None,
        }
    }

    /// Give up after `max_attempts` attempts.
    pub fn bounded(backoff: Duration, max_attempts: u32) -> Self {
        Self {
            backoff,
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    /// Retry forever without sleeping. Test use.
    pub fn immediate() -> Self {
        Self::unbounded(Duration::ZERO)
    }

    /// Run `op` until it succeeds, fails non-transiently, or the attempt cap
    /// is reached.
    pub async fn run<F, Fut, T>(&self, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => e,
                Err(e) => return Err(e),
            };

            if self.max_attempts.is_some_and(|max| attempt >= max) {
                tracing::error!(attempts = attempt, error = %err, "giving up on completion request");
                return Err(LlmError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            tracing::warn!(
                attempt,
                backoff_secs = self.backoff.as_secs_f64(),
                retry_after_secs = err.retry_after().map(|d| d.as_secs()),
                error = %err,
                "completion request failed, retrying"
            );
            tokio::time::sleep(self.backoff).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Self::DEFAULT_BACKOFF)
    }
}
