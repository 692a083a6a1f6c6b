// Bounded polling with fixed or exponential backoff

use crate::clock::Clock;
use crate::errors::{LocalstackError, Result};
use std::time::Duration;
use tracing::debug;

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed(Duration),
    Exponential {
        initial: Duration,
        multiplier: f64,
        max_interval: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the given (1-based) failed attempt.
    ///
    /// Exponential delays never exceed `max_interval`. A multiplier below 1
    /// shrinks the delay on each attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(interval) => interval,
            Backoff::Exponential {
                initial,
                multiplier,
                max_interval,
            } => {
                let exponent = attempt.saturating_sub(1).min(64) as i32;
                let secs = initial.as_secs_f64() * multiplier.powi(exponent);
                if !secs.is_finite() || secs >= max_interval.as_secs_f64() {
                    max_interval
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }
}

/// How long to keep polling before giving up
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub backoff: Backoff,
    /// Cap on the number of attempts; `None` means bounded only by time
    pub max_attempts: Option<u32>,
    /// Total time budget; `None` means bounded only by attempts
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Backoff::Exponential {
                initial: Duration::from_millis(500),
                multiplier: 1.5,
                max_interval: Duration::from_secs(60),
            },
            max_attempts: None,
            max_elapsed: Some(Duration::from_secs(60)),
        }
    }
}

impl RetryPolicy {
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            backoff: Backoff::Fixed(interval),
            max_attempts: Some(max_attempts),
            max_elapsed: None,
        }
    }
}

/// Run `check` until it succeeds or `policy` is exhausted.
///
/// The first attempt happens immediately. A sleep that would cross the
/// elapsed budget ends the loop instead of being taken.
pub fn retry_with(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    check: &mut dyn FnMut() -> Result<()>,
) -> Result<()> {
    let start = clock.now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let last_error = match check() {
            Ok(()) => return Ok(()),
            Err(e) => e.to_string(),
        };
        debug!(attempt = attempts, error = %last_error, "check failed");

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(LocalstackError::RetryExhausted {
                attempts,
                last_error,
            });
        }

        let delay = policy.backoff.delay_after(attempts);
        if let Some(budget) = policy.max_elapsed {
            let elapsed = clock.now().saturating_duration_since(start);
            if elapsed + delay > budget {
                return Err(LocalstackError::RetryExhausted {
                    attempts,
                    last_error,
                });
            }
        }

        clock.sleep(delay);
    }
}
