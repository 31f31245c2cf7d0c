//! Lazy GraphQL query chains for typed clients.
//!
//! A client starts at the [`Root`] and selects fields one after the other. Each selection
//! returns a new [`QueryContext`]; nothing leaves the process until a value is requested
//! with [`QueryContext::execute`]. The chain is then compiled into a single document, sent
//! through a [`Session`](session::Session), and the response is decoded into the
//! requested type.

#![warn(unreachable_pub)]

pub mod json_ext;

mod configuration;
pub mod context;
pub mod error;
pub mod graphql;
mod root;
pub mod session;
pub mod test_harness;

pub use configuration::Configuration;
pub use context::Arg;
pub use context::ArgValue;
pub use context::FromResponse;
pub use context::Json;
pub use context::ObjectHandle;
pub use context::QueryContext;
pub use context::Reference;
pub use context::structure;
pub use context::structure_handle;
pub use error::Error;
pub use error::ErrorKind;
pub use error::ExecError;
pub use error::QueryError;
pub use error::SessionError;
pub use root::Id;
pub use root::Root;
