//! Resilience layer for upstream calls
//!
//! This module turns an unreliable, rate-limited upstream call into a
//! dependable operation:
//! - Exponential backoff with bounded jitter and Retry-After hints
//! - Per-attempt deadlines merged with cooperative cancellation
//! - A bounded-attempt retry loop with an overall wall-clock budget

mod backoff;
mod cancel;
mod retry;
mod timeout;

pub use backoff::{parse_retry_after, BackoffPolicy};
pub use cancel::CancelToken;
pub use retry::{RetryConfig, RetryExecutor};
pub use timeout::guard_attempt;
