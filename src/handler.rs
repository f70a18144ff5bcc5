use crate::store::KvStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Components shared by every request handler
#[derive(Clone)]
pub struct BaseHandler {
    pub store: Arc<dyn KvStore>,
    pub request_timeout: Option<Duration>,
}

/// Cancellation scope of one request.
///
/// The token is cancelled when the scope is dropped, which is also what
/// happens when axum drops a handler because the client went away.
pub struct RequestScope {
    pub cancel: CancellationToken,
    _guard: DropGuard,
}

impl BaseHandler {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            request_timeout: None,
        }
    }

    /// Cancel store calls that run past `timeout`. Zero disables the deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn scope(&self) -> RequestScope {
        let cancel = CancellationToken::new();
        if let Some(timeout) = self.request_timeout {
            let deadline = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(timeout) => {
                        tracing::debug!(?timeout, "request deadline passed");
                        deadline.cancel();
                    }
                    _ = deadline.cancelled() => {}
                }
            });
        }
        RequestScope {
            _guard: cancel.clone().drop_guard(),
            cancel,
        }
    }
}
