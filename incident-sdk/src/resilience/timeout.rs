//! Attempt deadline guard
//!
//! Races a single upstream attempt against its deadline and the caller's
//! cancellation signal. Exactly one trigger is attributed per abandonment;
//! the select is biased so the cancellation signal wins a simultaneous
//! firing and a caller-requested stop is never misreported as a timeout.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, ServiceError};

use super::cancel::CancelToken;

/// Run one attempt under a hard deadline, merged with cancellation.
///
/// The deadline firing classifies the attempt as `Timeout` (retryable); the
/// token firing classifies it as `Cancelled` with the recorded cause. The
/// abandoned future is dropped, which releases the in-flight connection;
/// the upstream side is not guaranteed to stop executing.
pub async fn guard_attempt<F, T>(deadline: Duration, cancel: &CancelToken, attempt: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ServiceError::cancelled(cancel.kind())),
        _ = tokio::time::sleep(deadline) => Err(ServiceError::timeout(
            format!("No response within {:?}", deadline),
        )),
        result = attempt => result,
    }
}
