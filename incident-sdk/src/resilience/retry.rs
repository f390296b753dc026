//! Retrying dispatcher for upstream attempts
//!
//! This module provides the bounded-attempt request loop at the center of
//! the SDK: each attempt runs under the deadline guard, failures are
//! classified by kind, retryable ones wait out the backoff policy, and the
//! whole invocation observes a wall-clock budget that includes the waits.

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, warn};

use crate::error::{FailureClass, Result, ServiceError};

use super::backoff::BackoffPolicy;
use super::cancel::CancelToken;
use super::timeout::guard_attempt;

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempt budget, including the initial attempt
    pub max_attempts: u32,

    /// Hard deadline for a single attempt
    pub attempt_timeout: Duration,

    /// Wall-clock budget for the whole invocation, waits included
    pub total_budget: Duration,

    /// Backoff policy applied between retryable failures
    pub backoff: BackoffPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(20),
            total_budget: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Executor for retry operations with exponential backoff
///
/// Per invocation the executor walks `Attempting(n)` into exactly one of
/// success, a terminal failure, or silent cancellation. It consults only the
/// failure partition; response bodies were already consumed by whoever
/// classified the failure.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create a new retry executor with the specified configuration
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Get the current retry configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute a fallible operation with retries according to the
    /// configuration.
    ///
    /// `operation` is invoked once per attempt and must produce a fresh
    /// future each time. Cancellation is honored before each attempt, inside
    /// it via the guard, and during backoff waits.
    pub async fn execute<F, Fut, T>(&self, cancel: &CancelToken, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ServiceError::cancelled(cancel.kind()));
            }

            // An attempt never outlives the overall budget.
            let remaining = self.config.total_budget.saturating_sub(started.elapsed());
            let deadline = self.config.attempt_timeout.min(remaining);

            debug!(
                "Attempt {}/{} (elapsed {:?})",
                attempt + 1,
                self.config.max_attempts,
                started.elapsed()
            );

            let err = match guard_attempt(deadline, cancel, operation()).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match err.class() {
                FailureClass::Cancelled => return Err(err),
                FailureClass::Terminal => return Err(err),
                FailureClass::Retryable => {
                    let failed = attempt;
                    attempt += 1;

                    if attempt >= self.config.max_attempts {
                        warn!(
                            "Retry budget exhausted after {} attempts: {}",
                            attempt, err
                        );
                        return Err(err);
                    }

                    let delay = self.config.backoff.delay_for_failure(
                        &err,
                        failed,
                        Utc::now(),
                        &mut rand::thread_rng(),
                    );

                    if started.elapsed() + delay >= self.config.total_budget {
                        warn!(
                            "Total budget of {:?} leaves no room for a {:?} wait, giving up: {}",
                            self.config.total_budget, delay, err
                        );
                        return Err(err);
                    }

                    warn!(
                        "Attempt {} failed with retryable error, retrying in {:?}: {}",
                        failed + 1,
                        delay,
                        err
                    );

                    if !wait_for_retry(cancel, delay).await {
                        return Err(ServiceError::cancelled(cancel.kind()));
                    }
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

/// Sleep out a backoff delay unless the token fires first.
async fn wait_for_retry(cancel: &CancelToken, delay: Duration) -> bool {
    if delay.is_zero() {
        return true;
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
