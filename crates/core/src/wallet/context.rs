//! Per-call cancellation and deadline.
//!
//! Every store and cache call made on behalf of a request runs through
//! [`CallContext::run`], which races it against the request's cancellation
//! token and deadline. Dropping the inner future on cancellation rolls back
//! any uncommitted database work it started.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::CallError;

/// Cancellation signal and optional deadline for one request.
#[derive(Debug, Clone)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never canceled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout_after(timeout)
    }

    /// A context canceled whenever `parent` is canceled, expiring `timeout` from now.
    #[must_use]
    pub fn child_of(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            cancel: parent.child_token(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Returns a copy sharing this context's cancellation, with a deadline
    /// no later than `timeout` from now.
    #[must_use]
    pub fn timeout_after(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// Cancels this context and every call currently running under it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Runs `fut` unless the context is canceled or its deadline passes first.
    ///
    /// # Errors
    ///
    /// Returns `CallError::Canceled` or `CallError::Timeout` when `fut` did not
    /// complete; `fut` is dropped in that case.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, CallError>
    where
        F: Future<Output = T>,
    {
        if self.cancel.is_cancelled() {
            return Err(CallError::Canceled);
        }

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(CallError::Canceled),
            () = deadline => Err(CallError::Timeout),
            value = fut => Ok(value),
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = CallContext::with_timeout(Duration::from_secs(5));
        let value = ctx.run(async { 42 }).await;
        assert_eq!(value, Ok(42));
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let ctx = CallContext::with_timeout(Duration::from_millis(20));
        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(result, Err(CallError::Timeout));
    }

    #[tokio::test]
    async fn test_run_after_cancel() {
        let ctx = CallContext::background();
        ctx.cancel();
        let result = ctx.run(async { 1 }).await;
        assert_eq!(result, Err(CallError::Canceled));
    }

    #[tokio::test]
    async fn test_cancel_during_call() {
        let ctx = CallContext::background();
        let canceler = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceler.cancel();
        });

        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(result, Err(CallError::Canceled));
    }

    #[tokio::test]
    async fn test_parent_cancellation_propagates() {
        let shutdown = CancellationToken::new();
        let ctx = CallContext::child_of(&shutdown, Duration::from_secs(5));
        shutdown.cancel();
        assert_eq!(ctx.run(async { 1 }).await, Err(CallError::Canceled));
    }

    #[tokio::test]
    async fn test_timeout_after_keeps_earlier_deadline() {
        let ctx = CallContext::with_timeout(Duration::from_millis(10));
        let narrowed = ctx.timeout_after(Duration::from_secs(60));
        assert_eq!(narrowed.deadline, ctx.deadline);

        ctx.cancel();
        assert_eq!(narrowed.run(async { 1 }).await, Err(CallError::Canceled));
    }
}
