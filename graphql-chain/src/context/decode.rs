//! Decoding of response payloads into typed values.

use serde::de::DeserializeOwned;

use super::QueryContext;
use crate::error::Error;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::json_ext::ValueExt;

/// A type that can be decoded from the value selected by a chain.
pub trait FromResponse: Sized {
    /// Whether `null` is a valid response for this type.
    fn accepts_null() -> bool {
        false
    }

    /// Decodes `value`. Returned object handles are bound to `context`.
    fn from_response(value: Value, context: &QueryContext) -> Result<Self, Error>;
}

/// Decodes `value` as a `T`, rejecting `null` unless `T` accepts it.
pub fn structure<T: FromResponse>(value: Value, context: &QueryContext) -> Result<T, Error> {
    if value.is_null() && !T::accepts_null() {
        return Err(Error::Validation {
            reason: "required field got a null response; check if parent fields are valid"
                .to_string(),
        });
    }
    T::from_response(value, context)
}

impl QueryContext {
    /// Walks `data` along the chain and decodes what is found at its end.
    ///
    /// The walk stops early at the first value that is not an object. Accessors that fetch
    /// the payload themselves use this to decode it the way [`QueryContext::execute`] does.
    pub fn get_value<T: FromResponse>(&self, data: Object) -> Result<T, Error> {
        let mut value = Value::Object(data);
        for field in &self.selections {
            let Value::Object(object) = &mut value else {
                break;
            };
            let Some(next) = object.remove(field.name.as_str()) else {
                return Err(Error::MalformedResponse {
                    reason: format!("missing field '{}'", field.name),
                });
            };
            value = next;
        }
        structure(value, self)
    }
}

fn deserialize<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json_bytes::from_value(value).map_err(|err| Error::Decode {
        type_name: std::any::type_name::<T>(),
        reason: err.to_string(),
    })
}

macro_rules! scalar_from_response {
    ($($scalar:ty),+ $(,)?) => {$(
        impl FromResponse for $scalar {
            fn from_response(value: Value, _context: &QueryContext) -> Result<Self, Error> {
                deserialize(value)
            }
        }
    )+};
}

scalar_from_response!(String, bool, i32, i64, u32, u64, f32, f64);

impl FromResponse for () {
    fn accepts_null() -> bool {
        true
    }

    fn from_response(_value: Value, _context: &QueryContext) -> Result<Self, Error> {
        Ok(())
    }
}

impl FromResponse for Value {
    fn accepts_null() -> bool {
        true
    }

    fn from_response(value: Value, _context: &QueryContext) -> Result<Self, Error> {
        Ok(value)
    }
}

impl<T: FromResponse> FromResponse for Option<T> {
    fn accepts_null() -> bool {
        true
    }

    fn from_response(value: Value, context: &QueryContext) -> Result<Self, Error> {
        if value.is_null() {
            return Ok(None);
        }
        structure(value, context).map(Some)
    }
}

impl<T: FromResponse> FromResponse for Vec<T> {
    fn from_response(value: Value, context: &QueryContext) -> Result<Self, Error> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| structure(item, context))
                .collect(),
            other => Err(Error::Decode {
                type_name: std::any::type_name::<Self>(),
                reason: format!("expected an array, got {}", other.kind_name()),
            }),
        }
    }
}

/// Any serde type, decoded as a whole.
///
/// Used for the result of several fields selected at once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> FromResponse for Json<T> {
    fn from_response(value: Value, _context: &QueryContext) -> Result<Self, Error> {
        deserialize(value).map(Json)
    }
}

/// A typed handle on an object of the graph.
///
/// Handles wrap a [`QueryContext`] that selects the object, so they can be chained further.
pub trait ObjectHandle: Sized {
    /// The GraphQL type of the object.
    const TYPE_NAME: &'static str;

    /// The scalar used to identify objects of this type, if they can be loaded by id.
    const ID_TYPE: Option<&'static str> = None;

    /// The root field that loads an object of this type from its id.
    const LOAD_FIELD: Option<&'static str> = None;

    fn from_context(context: QueryContext) -> Self;

    fn context(&self) -> &QueryContext;

    /// Fields of the object that are decoded eagerly when present in a response.
    fn attributes() -> &'static [&'static str] {
        &[]
    }

    /// Assigns the decoded value of one of [`ObjectHandle::attributes`].
    fn set_attribute(
        &mut self,
        _name: &str,
        _value: Value,
        _context: &QueryContext,
    ) -> Result<(), Error> {
        Ok(())
    }
}

/// Builds a handle bound to `context` and assigns the attributes present in `value`.
pub fn structure_handle<T: ObjectHandle>(value: Value, context: &QueryContext) -> Result<T, Error> {
    let mut handle = T::from_context(context.clone());
    match value {
        Value::Object(mut object) => {
            for name in T::attributes() {
                if let Some(attribute) = object.remove(*name) {
                    handle.set_attribute(name, attribute, context)?;
                }
            }
            Ok(handle)
        }
        other => Err(Error::Decode {
            type_name: T::TYPE_NAME,
            reason: format!("expected an object, got {}", other.kind_name()),
        }),
    }
}

/// Implements [`FromResponse`](crate::context::FromResponse) for [`ObjectHandle`] types.
#[macro_export]
macro_rules! handle_from_response {
    ($($handle:ty),+ $(,)?) => {$(
        impl $crate::context::FromResponse for $handle {
            fn from_response(
                value: $crate::json_ext::Value,
                context: &$crate::context::QueryContext,
            ) -> Result<Self, $crate::error::Error> {
                $crate::context::structure_handle(value, context)
            }
        }
    )+};
}
