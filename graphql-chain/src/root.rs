//! The query root and loading of objects by id.

use std::sync::Arc;

use apollo_compiler::Schema;
use apollo_compiler::validation::Valid;

use crate::configuration::Configuration;
use crate::context::Arg;
use crate::context::ObjectHandle;
use crate::context::QueryContext;
use crate::error::Error;
use crate::session::Session;
use crate::session::TimeoutSession;

/// An object identifier, optionally tagged with the scalar type it was issued as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Id {
    type_name: Option<String>,
    value: String,
}

impl Id {
    /// An identifier of the id scalar `type_name`, such as `ContainerID`.
    pub fn new(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            value: value.into(),
        }
    }

    /// An untyped identifier, accepted for any type.
    pub fn raw(value: impl Into<String>) -> Self {
        Self {
            type_name: None,
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::raw(value)
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::raw(value)
    }
}

/// The top level `Query` object.
#[derive(Clone, Debug)]
pub struct Root {
    context: QueryContext,
}

impl Root {
    /// A root bound to `session`, with the default configuration.
    pub fn from_session(session: Arc<dyn Session>, schema: Arc<Valid<Schema>>) -> Self {
        Self {
            context: QueryContext::new(session, schema, Arc::new(Configuration::default())),
        }
    }

    /// A root bound to `session`. Round trips are limited to `execute_timeout` when it is set.
    pub fn with_configuration(
        session: impl Session,
        schema: Arc<Valid<Schema>>,
        configuration: Configuration,
    ) -> Self {
        let session: Arc<dyn Session> = match configuration.execute_timeout {
            Some(timeout) => Arc::new(TimeoutSession::new(session, timeout)),
            None => Arc::new(session),
        };
        Self {
            context: QueryContext::new(session, schema, Arc::new(configuration)),
        }
    }

    /// Selects a field of the query root.
    pub fn select(&self, field_name: &str, args: impl IntoIterator<Item = Arg>) -> QueryContext {
        self.context
            .select(self.context.root_type(), field_name, args)
    }

    /// Returns a handle on the object of type `T` identified by `id`.
    ///
    /// Nothing is sent until the handle is executed.
    pub fn object_instance<T: ObjectHandle>(&self, id: impl Into<Id>) -> Result<T, Error> {
        let (Some(id_type), Some(load_field)) = (T::ID_TYPE, T::LOAD_FIELD) else {
            return Err(Error::UnsupportedType {
                type_name: T::TYPE_NAME.to_string(),
            });
        };
        let id = id.into();
        if let Some(actual) = &id.type_name
            && actual != id_type
        {
            return Err(Error::IdTypeMismatch {
                expected: id_type.to_string(),
                actual: actual.clone(),
            });
        }
        Ok(T::from_context(
            self.select(load_field, [Arg::new("id", id.value)]),
        ))
    }
}

impl ObjectHandle for Root {
    const TYPE_NAME: &'static str = "Query";

    /// The root always starts from an empty chain.
    fn from_context(context: QueryContext) -> Self {
        Self {
            context: context.with_empty_selections(),
        }
    }

    fn context(&self) -> &QueryContext {
        &self.context
    }
}
