//! Bounded retry policy for upstream throttling.
//!
//! The state machine only decides; the caller does the sleeping. That keeps
//! the policy testable without a clock.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Delay before retry number `attempt + 1`, never more than `max_wait`.
///
/// A usable `Retry-After` wins; otherwise linear backoff `base * (attempt + 1)`.
pub fn backoff_delay(attempt: u32, retry_after: Option<Duration>, base: Duration, max_wait: Duration) -> Duration {
    let wait = match retry_after {
        Some(d) => d,
        None => base.saturating_mul(attempt.saturating_add(1)),
    };
    wait.min(max_wait)
}

/// Parse a `Retry-After` value: delta-seconds or an HTTP-date relative to `now`.
/// Values too large for a `Duration` saturate; `backoff_delay` caps them.
pub fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    if let Ok(secs) = raw.parse::<f64>() {
        if secs.is_nan() || secs < 0.0 {
            return None;
        }
        return Some(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX));
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    let delta = at.signed_duration_since(now);
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

#[derive(Debug)]
pub enum RetryStep {
    Wait(Duration),
    GiveUp(AppError),
}

/// `attempt` counts completed calls that came back throttled.
#[derive(Debug)]
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
    base_delay: Duration,
    max_wait: Duration,
}

impl RetryState {
    pub fn new(max_attempts: u32, base_delay: Duration, max_wait: Duration) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
            base_delay,
            max_wait,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a 429 for `url` and decide what happens next.
    pub fn on_rate_limited(&mut self, url: &str, retry_after: Option<Duration>) -> RetryStep {
        let delay = backoff_delay(self.attempt, retry_after, self.base_delay, self.max_wait);
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return RetryStep::GiveUp(AppError::RateLimited {
                url: url.to_string(),
                attempts: self.attempt,
            });
        }
        RetryStep::Wait(delay)
    }
}
