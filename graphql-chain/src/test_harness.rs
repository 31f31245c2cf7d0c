//! Test utilities for code built on query chains.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::ast;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::SessionError;
use crate::graphql;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::session::Session;

type ErrorFactory = Arc<dyn Fn() -> SessionError + Send + Sync>;

#[derive(Clone)]
enum MockResponse {
    Data(Value),
    Error(ErrorFactory),
}

/// Formats `query` the way [`MockSession`] compares requests.
///
/// Unparsable input is returned unchanged.
pub fn normalize(query: &str) -> String {
    ast::Document::parse(query, "mock.graphql")
        .map(|document| document.serialize().no_indent().to_string())
        .unwrap_or_else(|_| query.to_string())
}

/// A [`Session`] answering from canned responses keyed by query.
///
/// Queries are compared after normalization, so whitespace does not matter.
#[derive(Default)]
pub struct MockSession {
    mocks: HashMap<String, MockResponse>,
    delay: Option<Duration>,
    query_delays: HashMap<String, Duration>,
    received: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `query` with `data`.
    pub fn with_data(mut self, query: &str, data: Value) -> Self {
        self.mocks.insert(normalize(query), MockResponse::Data(data));
        self
    }

    /// Fails `query` with the error built by `error`.
    pub fn with_error(
        mut self,
        query: &str,
        error: impl Fn() -> SessionError + Send + Sync + 'static,
    ) -> Self {
        self.mocks
            .insert(normalize(query), MockResponse::Error(Arc::new(error)));
        self
    }

    /// Delays every response by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delays the response to `query` by `delay`, overriding [`MockSession::with_delay`].
    pub fn with_query_delay(mut self, query: &str, delay: Duration) -> Self {
        self.query_delays.insert(normalize(query), delay);
        self
    }

    /// The normalized queries received so far, in order.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// The normalized queries answered so far, in order.
    ///
    /// A request dropped before its delay elapsed is received but never completed.
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().clone()
    }

    /// The highest number of requests that were in progress at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for MockSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSession")
            .field("mocks", &self.mocks.keys().collect::<Vec<_>>())
            .field("delay", &self.delay)
            .finish()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Session for MockSession {
    async fn execute(&self, document: &ExecutableDocument) -> Result<Object, SessionError> {
        let query = normalize(&document.serialize().no_indent().to_string());
        self.received.lock().push(query.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.query_delays.get(&query).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }
        self.completed.lock().push(query.clone());

        match self.mocks.get(&query) {
            Some(MockResponse::Data(Value::Object(data))) => Ok(data.clone()),
            Some(MockResponse::Data(_)) => Err(SessionError::Protocol {
                reason: "mocked data must be an object".to_string(),
            }),
            Some(MockResponse::Error(error)) => Err(error()),
            None => Err(SessionError::Query {
                errors: vec![
                    graphql::Error::builder()
                        .message(format!("couldn't find mock for query {query}"))
                        .build(),
                ],
                data: None,
            }),
        }
    }
}
