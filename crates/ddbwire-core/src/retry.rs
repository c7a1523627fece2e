//! Retry with backoff under a total time budget.
//!
//! Each attempt's outcome is classified: transport failures, throttling and
//! transient service errors are retried, an expired session token is retried
//! once the caller has invalidated its cached key, and everything else is
//! returned immediately. A retry is only scheduled if it ends inside the budget;
//! otherwise the call fails with [`Error::Timeout`] carrying the last failure.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::error::Error;

/// How the base delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// `base_delay * factor^n`, capped at `max_delay`.
    Exponential {
        /// Delay before the first retry.
        base_delay: Duration,
        /// Growth factor per retry.
        factor: f64,
        /// Upper bound for any single delay.
        max_delay: Duration,
    },
    /// The same delay before every retry.
    Constant(Duration),
}

/// Randomisation applied to each delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// Use the backoff delay as is.
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// Uniform in `[base, previous * 3]`, capped at the maximum delay.
    Decorrelated,
}

/// Retry configuration, fixed at client construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total time allowed across all attempts and delays.
    pub time_limit: Duration,
    /// Delay growth.
    pub backoff: Backoff,
    /// Delay randomisation.
    pub jitter: Jitter,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            backoff: Backoff::Exponential {
                base_delay: Duration::from_millis(50),
                factor: 2.0,
                max_delay: Duration::from_secs(1),
            },
            jitter: Jitter::Full,
        }
    }
}

impl RetryConfig {
    /// Never retry: any retryable failure times out immediately.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            time_limit: Duration::ZERO,
            ..Self::default()
        }
    }

    /// The delay sequence for one logical call.
    #[must_use]
    pub fn delays(&self) -> Delays {
        Delays {
            backoff: self.backoff,
            jitter: self.jitter,
            retries: 0,
            previous: None,
        }
    }
}

/// Infinite iterator of delays for successive retries.
#[derive(Debug, Clone)]
pub struct Delays {
    backoff: Backoff,
    jitter: Jitter,
    retries: i32,
    previous: Option<Duration>,
}

impl Delays {
    fn base(&self) -> Duration {
        match self.backoff {
            Backoff::Exponential { base_delay, .. } => base_delay,
            Backoff::Constant(delay) => delay,
        }
    }

    fn cap(&self) -> Duration {
        match self.backoff {
            Backoff::Exponential { max_delay, .. } => max_delay,
            Backoff::Constant(delay) => delay,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn raw(&self) -> Duration {
        match self.backoff {
            Backoff::Exponential {
                base_delay,
                factor,
                max_delay,
            } => {
                let nanos = (base_delay.as_nanos() as f64 * factor.powi(self.retries)).round();
                if nanos.is_finite() && nanos < max_delay.as_nanos() as f64 {
                    Duration::from_nanos(nanos as u64)
                } else {
                    max_delay
                }
            }
            Backoff::Constant(delay) => delay,
        }
    }
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = match self.jitter {
            Jitter::None => self.raw(),
            Jitter::Full => self.raw().mul_f64(rand::random::<f64>()),
            Jitter::Decorrelated => {
                let base = self.base();
                let upper = self.previous.unwrap_or(base).saturating_mul(3);
                let spread = upper.saturating_sub(base);
                (base + spread.mul_f64(rand::random::<f64>())).min(self.cap())
            }
        };
        self.retries = self.retries.saturating_add(1);
        self.previous = Some(delay);
        Some(delay)
    }
}

fn should_retry(err: &Error) -> bool {
    match err {
        Error::Service(e) => e.is_retryable() || e.is_expired_token(),
        other => other.is_retryable(),
    }
}

/// Run `attempt` until it succeeds, fails terminally, or the budget runs out.
///
/// `attempt` receives the 1-based attempt number and must rebuild (and re-sign)
/// its request each time.
pub async fn retry<T, F, Fut>(config: &RetryConfig, mut attempt: F) -> Result<T, Error>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let start = Instant::now();
    let mut delays = config.delays();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let err = match attempt(attempts).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !should_retry(&err) {
            return Err(err);
        }

        let delay = delays.next().unwrap_or(Duration::ZERO);
        let elapsed = start.elapsed();
        if elapsed + delay >= config.time_limit {
            warn!(attempts, ?elapsed, error = %err, "retry budget exhausted");
            return Err(Error::Timeout {
                attempts,
                elapsed,
                budget: config.time_limit,
                last: Box::new(err),
            });
        }

        warn!(attempts, ?delay, error = %err, "retrying after failure");
        tokio::time::sleep(delay).await;
    }
}
