//! Exponential backoff policy with bounded jitter
//!
//! The delay computation is a pure function of the attempt index, the
//! policy parameters, and the supplied random generator, so both sides of
//! the service boundary can reproduce it exactly from a seed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::ServiceError;

/// Upper bound on the random jitter added to every computed delay.
const JITTER_CAP: Duration = Duration::from_secs(1);

/// Largest exponent applied to the initial delay; the cap makes anything
/// beyond this unreachable anyway.
const MAX_EXPONENT: u32 = 16;

/// Backoff parameters for the retry loop
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Ceiling for the exponential progression and for server hints
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl BackoffPolicy {
    /// Deterministic part of the delay: `initial * 2^attempt`, capped.
    ///
    /// `attempt` is the 0-based index of the attempt that just failed.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(MAX_EXPONENT);
        let scaled = self
            .initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay);
        scaled.min(self.max_delay)
    }

    /// Full delay for an attempt: capped exponential plus uniform jitter in
    /// `[0, 1s)`. Jitter is applied after the cap, so the result never
    /// exceeds `max_delay + 1s`.
    pub fn delay<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        self.base_delay(attempt) + JITTER_CAP.mul_f64(rng.gen_range(0.0..1.0))
    }

    /// Delay for a classified failure.
    ///
    /// A parsable `Retry-After` hint on a rate-limit failure overrides the
    /// exponential delay and is capped at `max_delay`; anything else falls
    /// back to `delay`.
    pub fn delay_for_failure<R: Rng>(
        &self,
        err: &ServiceError,
        attempt: u32,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Duration {
        if let ServiceError::RateLimited {
            retry_after: Some(raw),
            ..
        } = err
        {
            if let Some(hint) = parse_retry_after(raw, now) {
                return hint.min(self.max_delay);
            }
        }
        self.delay(attempt, rng)
    }
}

/// Parse a `Retry-After` value as either a whole-second count or an HTTP
/// date; a date in the past yields zero. Returns `None` when unparsable.
pub fn parse_retry_after(raw: &str, now: DateTime<Utc>) -> Option<Duration> {
    let raw = raw.trim();

    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(raw).ok()?;
    let delta = at.with_timezone(&Utc) - now;
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}
