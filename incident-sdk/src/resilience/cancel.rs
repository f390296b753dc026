//! Cooperative cancellation with cause attribution
//!
//! Wraps a `CancellationToken` together with a write-once record of *why*
//! it fired, so an abandoned attempt can report whether the caller asked for
//! the cancellation or a newer operation superseded it.

use std::sync::Arc;
use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

use crate::error::CancelKind;

/// Cancellation handle passed into every suspension point.
///
/// Cloning yields another handle to the same underlying signal. The cause
/// recorded by the first `cancel` call wins; later calls are no-ops.
#[derive(Debug, Clone)]
pub struct CancelToken {
    token: CancellationToken,
    cause: Arc<OnceLock<CancelKind>>,
}

impl CancelToken {
    /// Create a fresh, unfired token.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            cause: Arc::new(OnceLock::new()),
        }
    }

    /// Fire the token, recording the cause.
    pub fn cancel(&self, kind: CancelKind) {
        let _ = self.cause.set(kind);
        self.token.cancel();
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the token fires.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// The cause recorded when the token fired.
    ///
    /// Defaults to `Caller` if queried before any cause was recorded.
    pub fn kind(&self) -> CancelKind {
        self.cause.get().copied().unwrap_or(CancelKind::Caller)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_cause_wins() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        token.cancel(CancelKind::Superseded);
        token.cancel(CancelKind::Caller);

        assert!(token.is_cancelled());
        assert_eq!(token.kind(), CancelKind::Superseded);
    }

    #[test]
    fn test_clones_share_signal() {
        let token = CancelToken::new();
        let clone = token.clone();

        clone.cancel(CancelKind::Caller);

        assert!(token.is_cancelled());
        assert_eq!(token.kind(), CancelKind::Caller);
    }

    #[tokio::test]
    async fn test_cancelled_resolves() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            waiter.kind()
        });

        token.cancel(CancelKind::Superseded);
        assert_eq!(handle.await.unwrap(), CancelKind::Superseded);
    }
}
