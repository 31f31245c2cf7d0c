use std::time::Duration;

use apollo_compiler::ExecutableDocument;
use async_trait::async_trait;

use super::Session;
use crate::error::SessionError;
use crate::json_ext::Object;

/// Applies a time budget to every round trip of the inner session.
#[derive(Debug)]
pub struct TimeoutSession<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutSession<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<S: Session> Session for TimeoutSession<S> {
    async fn execute(&self, document: &ExecutableDocument) -> Result<Object, SessionError> {
        match tokio::time::timeout(self.timeout, self.inner.execute(document)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(timeout = ?self.timeout, "request timed out");
                Err(SessionError::Timeout)
            }
        }
    }
}
