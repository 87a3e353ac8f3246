//! Adapter for completion-callback SDKs.
//!
//! Native messaging SDKs usually take a completion handler per request and
//! call it from their own thread. [`CallbackBoundary`] turns that into an
//! awaitable call: each request gets a one-shot [`Completion`], and the
//! call is bounded by a timeout so a lost callback cannot leave a request
//! pending forever.

use super::{BoundaryError, PushHandler, SdkBoundary, SdkMethod};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// A messaging SDK that reports results through completion handles.
pub trait CallbackSdk: Send + Sync {
    /// Start a request. The SDK must eventually resolve `completion`, from
    /// any thread; `invoke` itself must not block.
    fn invoke(&self, method: SdkMethod, params: Option<String>, completion: Completion);

    /// Register the receiver of push notifications.
    fn set_push_handler(&self, handler: Arc<dyn PushHandler>);
}

/// Resolves one pending request.
///
/// Resolving consumes the handle, so a request resolves at most once.
/// Dropping it unresolved fails the request with [`BoundaryError::Dropped`].
pub struct Completion {
    tx: oneshot::Sender<Result<String, BoundaryError>>,
}

impl Completion {
    /// Create a completion and the receiver its result arrives on.
    pub fn channel() -> (Self, oneshot::Receiver<Result<String, BoundaryError>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Resolve with a JSON success payload.
    pub fn succeed(self, payload: impl Into<String>) {
        self.resolve(Ok(payload.into()));
    }

    /// Resolve with an SDK failure.
    pub fn fail(self, code: i32, message: impl Into<String>) {
        self.resolve(Err(BoundaryError::Remote {
            code,
            message: message.into(),
        }));
    }

    /// Resolve with an arbitrary result.
    pub fn resolve(self, result: Result<String, BoundaryError>) {
        // The caller may have timed out already.
        if self.tx.send(result).is_err() {
            tracing::debug!("Completion resolved after its request was abandoned");
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("abandoned", &self.tx.is_closed())
            .finish()
    }
}

/// [`SdkBoundary`] over a [`CallbackSdk`], with a per-request timeout.
#[derive(Debug)]
pub struct CallbackBoundary<S> {
    sdk: S,
    timeout: Duration,
}

impl<S: CallbackSdk> CallbackBoundary<S> {
    /// Wrap `sdk`, failing any request that takes longer than `timeout`.
    pub fn new(sdk: S, timeout: Duration) -> Self {
        Self { sdk, timeout }
    }

    /// The wrapped SDK.
    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<S: CallbackSdk> SdkBoundary for CallbackBoundary<S> {
    async fn call(
        &self,
        method: SdkMethod,
        params: Option<String>,
    ) -> Result<String, BoundaryError> {
        let (completion, rx) = Completion::channel();
        self.sdk.invoke(method, params, completion);

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                tracing::warn!("SDK dropped the completion for {}", method);
                Err(BoundaryError::Dropped)
            }
            Err(_) => {
                tracing::warn!(
                    "SDK request {} timed out after {}s",
                    method,
                    self.timeout.as_secs()
                );
                Err(BoundaryError::Timeout)
            }
        }
    }

    fn set_push_handler(&self, handler: Arc<dyn PushHandler>) {
        self.sdk.set_push_handler(handler);
    }
}
