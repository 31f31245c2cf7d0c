//! Connections to the engine.
//!
//! A [`Session`] executes one request document per call and hands back the `data` of the
//! response. Chains never talk to the transport directly.

use apollo_compiler::ExecutableDocument;
use async_trait::async_trait;

use crate::error::SessionError;
use crate::json_ext::Object;

mod http;
mod timeout;

pub use self::http::HttpSession;
pub use self::timeout::TimeoutSession;

/// Executes request documents against the engine.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Sends `document` and returns the `data` object of the response.
    async fn execute(&self, document: &ExecutableDocument) -> Result<Object, SessionError>;
}
