use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use apollo_compiler::ExecutableDocument;
use async_trait::async_trait;
use url::Url;

use super::Session;
use crate::error::SessionError;
use crate::graphql;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::json_ext::ValueExt;

/// A session that posts GraphQL requests to an HTTP endpoint.
#[derive(Debug)]
pub struct HttpSession {
    client: reqwest::Client,
    endpoint: Url,
    closed: AtomicBool,
}

impl HttpSession {
    /// Construct a session that will post to the supplied URL.
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self {
            client,
            endpoint,
            closed: AtomicBool::new(false),
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Rejects every further request with [`SessionError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn request_error(error: reqwest::Error) -> SessionError {
    if error.is_timeout() {
        SessionError::Timeout
    } else {
        SessionError::Request(error.into())
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn execute(&self, document: &ExecutableDocument) -> Result<Object, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }

        let request = graphql::Request::new(document.serialize().no_indent().to_string());
        tracing::debug!(endpoint = %self.endpoint, "making request");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(request_error)?;
        if status.is_server_error() {
            return Err(SessionError::Server {
                status: status.as_u16(),
                reason: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let response: graphql::Response = match serde_json::from_slice(&body) {
            Ok(response) => response,
            Err(_) if !status.is_success() => {
                return Err(SessionError::Server {
                    status: status.as_u16(),
                    reason: String::from_utf8_lossy(&body).into_owned(),
                });
            }
            Err(err) => {
                return Err(SessionError::Protocol {
                    reason: err.to_string(),
                });
            }
        };

        if !response.errors.is_empty() {
            return Err(SessionError::Query {
                errors: response.errors,
                data: response.data,
            });
        }
        match response.data {
            Some(Value::Object(data)) => Ok(data),
            Some(other) => Err(SessionError::Protocol {
                reason: format!("expected data to be an object, got {}", other.kind_name()),
            }),
            None => Err(SessionError::Protocol {
                reason: "response has no data".to_string(),
            }),
        }
    }
}
