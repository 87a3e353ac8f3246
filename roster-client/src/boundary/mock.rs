//! Mock SDK boundary for testing.
//!
//! Allows queueing per-method responses, capturing issued calls, and
//! simulating SDK pushes.

use super::{dispatch_push, BoundaryError, PushHandler, SdkBoundary, SdkMethod};
use async_trait::async_trait;
use roster_types::PushKind;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock SDK boundary for testing.
///
/// Clones share state, so a test can keep a handle after moving one into
/// a `RosterSync`. A call with nothing queued succeeds with an empty
/// payload.
#[derive(Clone, Default)]
pub struct MockBoundary {
    inner: Arc<Mutex<MockBoundaryInner>>,
}

#[derive(Default)]
struct MockBoundaryInner {
    responses: HashMap<SdkMethod, VecDeque<Result<String, BoundaryError>>>,
    calls: Vec<(SdkMethod, Option<String>)>,
    handler: Option<Arc<dyn PushHandler>>,
}

impl MockBoundary {
    /// Create a new mock boundary.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockBoundaryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a JSON response for the next call to `method`.
    pub fn queue_response(&self, method: SdkMethod, json: &str) {
        self.lock()
            .responses
            .entry(method)
            .or_default()
            .push_back(Ok(json.to_string()));
    }

    /// Cause the next call to `method` to fail with `error`.
    pub fn fail_next(&self, method: SdkMethod, error: BoundaryError) {
        self.lock()
            .responses
            .entry(method)
            .or_default()
            .push_back(Err(error));
    }

    /// All calls issued so far, in order.
    pub fn calls(&self) -> Vec<(SdkMethod, Option<String>)> {
        self.lock().calls.clone()
    }

    /// The last call issued.
    pub fn last_call(&self) -> Option<(SdkMethod, Option<String>)> {
        self.lock().calls.last().cloned()
    }

    /// Number of calls issued.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Whether a push handler is registered.
    pub fn has_push_handler(&self) -> bool {
        self.lock().handler.is_some()
    }

    /// Simulate an SDK push. Returns `false` if no handler is registered.
    pub fn push(&self, kind: PushKind, payload: &str) -> bool {
        // Release the lock before the handler runs.
        let handler = self.lock().handler.clone();
        match handler {
            Some(handler) => {
                dispatch_push(handler.as_ref(), kind, payload);
                true
            }
            None => false,
        }
    }

    /// Clear queued responses and recorded calls. The handler is kept.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.responses.clear();
        inner.calls.clear();
    }
}

impl fmt::Debug for MockBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("MockBoundary")
            .field("calls", &inner.calls.len())
            .field("has_push_handler", &inner.handler.is_some())
            .finish()
    }
}

#[async_trait]
impl SdkBoundary for MockBoundary {
    async fn call(
        &self,
        method: SdkMethod,
        params: Option<String>,
    ) -> Result<String, BoundaryError> {
        let mut inner = self.lock();
        inner.calls.push((method, params));
        inner
            .responses
            .get_mut(&method)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(String::new()))
    }

    fn set_push_handler(&self, handler: Arc<dyn PushHandler>) {
        self.lock().handler = Some(handler);
    }
}
