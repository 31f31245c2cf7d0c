//! Query chain errors.
use std::fmt;

use displaydoc::Display;
use thiserror::Error;
use tower::BoxError;

use crate::graphql;
use crate::json_ext::Value;

/// Value of the `_type` extension marking a failed command execution.
pub(crate) const EXEC_ERROR_TYPE: &str = "EXEC_ERROR";

const TIMEOUT_MESSAGE: &str = "request timed out; try setting a higher value for \
    'execute_timeout' in the configuration of this connection";

const CLOSED_MESSAGE: &str = "connection to the engine has been closed; make sure the API \
    is called within the scope of a valid connection";

/// Failures reported by a [`Session`](crate::session::Session) while executing a document.
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub enum SessionError {
    /// request exceeded its time budget
    Timeout,

    /// request failed: {0}
    Request(#[source] BoxError),

    /// connection is closed
    Closed,

    /// malformed response: {reason}
    Protocol {
        /// Why the response could not be understood.
        reason: String,
    },

    /// server responded with status {status}: {reason}
    Server {
        /// HTTP status code.
        status: u16,
        /// The response body, or the reason it could not be read.
        reason: String,
    },

    /// service returned errors: {errors:?}
    Query {
        /// The GraphQL errors of the response.
        errors: Vec<graphql::Error>,
        /// Partial data, if any.
        data: Option<Value>,
    },
}

/// The broad category of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The chain could not be turned into a request. Never retried.
    Construction,
    /// A round trip exceeded the configured time budget.
    Timeout,
    /// The connection failed or the response could not be understood.
    Transport,
    /// The service reported an error for the request document.
    Query,
    /// The response did not fit the expected type.
    Validation,
}

/// Errors raised while building, executing or decoding a query chain.
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub enum Error {
    /// invalid query: {reason}
    InvalidQuery {
        /// Why the chain could not be compiled.
        reason: String,
    },

    /// unsupported type '{type_name}'
    UnsupportedType {
        /// The type that cannot be loaded by identifier.
        type_name: String,
    },

    /// expected id type '{expected}', got '{actual}'
    IdTypeMismatch {
        /// The id type declared by the target type.
        expected: String,
        /// The id type that was given.
        actual: String,
    },

    /// {message}
    Timeout {
        /// Remediation hint.
        message: String,
        #[source]
        source: SessionError,
    },

    /// {message}
    Transport {
        /// What went wrong with the connection.
        message: String,
        #[source]
        source: SessionError,
    },

    /// {0}
    Query(#[from] QueryError),

    /// {0}
    Exec(#[from] ExecError),

    /// {0}
    Session(#[source] SessionError),

    /// {reason}
    Validation {
        /// What was invalid in the response.
        reason: String,
    },

    /// could not decode '{type_name}': {reason}
    Decode {
        /// The target type.
        type_name: &'static str,
        /// The decoding failure.
        reason: String,
    },

    /// response was malformed: {reason}
    MalformedResponse {
        /// The reason the response could not be walked.
        reason: String,
    },
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidQuery { .. }
            | Error::UnsupportedType { .. }
            | Error::IdTypeMismatch { .. } => ErrorKind::Construction,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Transport { .. } | Error::MalformedResponse { .. } => ErrorKind::Transport,
            Error::Query(_) | Error::Exec(_) | Error::Session(_) => ErrorKind::Query,
            Error::Validation { .. } | Error::Decode { .. } => ErrorKind::Validation,
        }
    }

    pub(crate) fn no_field_selected() -> Self {
        Error::InvalidQuery {
            reason: "no field has been selected".to_string(),
        }
    }

    /// Map a session failure for the request `query` to a domain error.
    pub(crate) fn from_session(error: SessionError, query: &str) -> Self {
        match error {
            SessionError::Timeout => Error::Timeout {
                message: TIMEOUT_MESSAGE.to_string(),
                source: SessionError::Timeout,
            },
            SessionError::Request(cause) => Error::Transport {
                message: format!("failed to make request: {cause}"),
                source: SessionError::Request(cause),
            },
            SessionError::Closed => Error::Transport {
                message: CLOSED_MESSAGE.to_string(),
                source: SessionError::Closed,
            },
            error @ (SessionError::Protocol { .. } | SessionError::Server { .. }) => {
                Error::Transport {
                    message: format!("unexpected response from engine: {error}"),
                    source: error,
                }
            }
            SessionError::Query { errors, data } => match QueryError::new(&errors, query) {
                Some(error) => error.into_domain(),
                None => Error::Session(SessionError::Query { errors, data }),
            },
        }
    }
}

/// An error reported by the service for a specific request document.
#[derive(Clone, Debug)]
pub struct QueryError {
    errors: Vec<graphql::Error>,
    query: String,
}

impl QueryError {
    /// Returns `None` when there is no error payload to derive from.
    fn new(errors: &[graphql::Error], query: &str) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }
        Some(Self {
            errors: errors.to_vec(),
            query: query.to_string(),
        })
    }

    fn into_domain(self) -> Error {
        if self.errors[0].extension_str("_type") == Some(EXEC_ERROR_TYPE) {
            Error::Exec(ExecError::from_query_error(self))
        } else {
            Error::Query(self)
        }
    }

    /// All the errors returned for the request. Never empty.
    pub fn errors(&self) -> &[graphql::Error] {
        &self.errors
    }

    /// The message of the first error.
    pub fn message(&self) -> &str {
        &self.errors[0].message
    }

    /// The request document that caused the error.
    pub fn debug_query(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for QueryError {}

/// A command executed by the engine did not complete successfully.
#[derive(Clone, Debug)]
pub struct ExecError {
    query_error: QueryError,
    command: Vec<String>,
    exit_code: i64,
    stdout: String,
    stderr: String,
}

impl ExecError {
    fn from_query_error(query_error: QueryError) -> Self {
        let first = &query_error.errors[0];
        let string = |key: &str| first.extension_str(key).unwrap_or_default().to_string();
        let command = first
            .extension("cmd")
            .and_then(Value::as_array)
            .map(|args| {
                args.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let exit_code = first
            .extension("exitCode")
            .and_then(Value::as_i64)
            .unwrap_or(-1);
        let stdout = string("stdout");
        let stderr = string("stderr");

        Self {
            command,
            exit_code,
            stdout,
            stderr,
            query_error,
        }
    }

    /// The arguments of the failed command.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// The exit code of the failed command, or -1 when it was not reported.
    pub fn exit_code(&self) -> i64 {
        self.exit_code
    }

    /// What the command wrote to standard output.
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// What the command wrote to standard error.
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// The underlying query error.
    pub fn query_error(&self) -> &QueryError {
        &self.query_error
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\nStdout:\n{}\nStderr:\n{}",
            self.query_error.message(),
            self.stdout,
            self.stderr
        )
    }
}

impl std::error::Error for ExecError {}
