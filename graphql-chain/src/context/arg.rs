use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json_bytes::ByteString;
use tokio::sync::OnceCell;

use super::ObjectHandle;
use super::QueryContext;
use crate::error::Error;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::json_ext::ValueExt;

/// An argument of a field selection.
#[derive(Clone, Debug)]
pub struct Arg {
    name: String,
    value: ArgValue,
    /// `None` when the argument declares no default.
    default: Option<Value>,
}

impl Arg {
    /// An argument without a declared default; it is always sent.
    pub fn new(name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            default: None,
        }
    }

    /// An argument that is omitted from the request when its value equals `default`.
    pub fn with_default(
        name: impl Into<String>,
        value: impl Into<ArgValue>,
        default: impl Into<ArgValue>,
    ) -> Self {
        let default = match default.into().into_input() {
            ArgValue::Value(value) => Some(value),
            _ => None,
        };
        Self {
            name: name.into(),
            value: value.into(),
            default,
        }
    }

    /// An optional argument, omitted from the request when `None`.
    pub fn optional<T: Into<ArgValue>>(name: impl Into<String>, value: Option<T>) -> Self {
        Self::with_default(
            name,
            value.map_or(ArgValue::Value(Value::Null), Into::into),
            Value::Null,
        )
    }

    /// The GraphQL name of the argument.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encodes the value for the wire, or returns `None` if it equals the declared default.
    pub(crate) fn into_input(self) -> Option<(String, ArgValue)> {
        let value = self.value.into_input();
        match (&self.default, &value) {
            (Some(default), ArgValue::Value(value)) if value == default => None,
            _ => Some((self.name, value)),
        }
    }
}

/// The value of an [`Arg`].
#[derive(Clone, Debug)]
pub enum ArgValue {
    /// A plain JSON value.
    Value(Value),
    /// The fields of a structured input type.
    Input(Object),
    /// A handle to another object, to be replaced by that object's id before compilation.
    Reference(Reference),
    /// A sequence of values, some of which may be references.
    List(Vec<ArgValue>),
    /// A NaN or infinite float. It has no GraphQL literal, so compiling it fails.
    NonFinite(f64),
}

impl ArgValue {
    /// Serializes a structured input type into its field mapping.
    pub fn input<T: Serialize>(input: &T) -> Result<Self, Error> {
        match serde_json_bytes::to_value(input) {
            Ok(Value::Object(fields)) => Ok(ArgValue::Input(fields)),
            Ok(other) => Err(Error::InvalidQuery {
                reason: format!(
                    "input types must serialize to an object, got {}",
                    other.kind_name()
                ),
            }),
            Err(err) => Err(Error::InvalidQuery {
                reason: format!("could not serialize input: {err}"),
            }),
        }
    }

    /// A reference to the object behind `handle`.
    pub fn reference<T: ObjectHandle>(handle: &T) -> Self {
        ArgValue::Reference(Reference::new(T::TYPE_NAME, handle.context().clone()))
    }

    /// Flattens structured inputs into plain values.
    ///
    /// Lists are encoded element-wise and collapse into a plain array once they hold no
    /// references. Encoding an encoded value returns it unchanged.
    pub(crate) fn into_input(self) -> ArgValue {
        match self {
            ArgValue::Input(fields) => ArgValue::Value(Value::Object(fields)),
            ArgValue::List(items) => {
                let items: Vec<ArgValue> = items.into_iter().map(ArgValue::into_input).collect();
                if items.iter().all(|item| matches!(item, ArgValue::Value(_))) {
                    ArgValue::Value(Value::Array(
                        items
                            .into_iter()
                            .filter_map(|item| match item {
                                ArgValue::Value(value) => Some(value),
                                _ => None,
                            })
                            .collect(),
                    ))
                } else {
                    ArgValue::List(items)
                }
            }
            other => other,
        }
    }

    #[cfg(test)]
    pub(crate) fn as_value(&self) -> Option<&Value> {
        match self {
            ArgValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        ArgValue::Value(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Value(Value::String(ByteString::from(value)))
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Value(Value::String(ByteString::from(value)))
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Value(Value::Bool(value))
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Value(Value::Number(value.into()))
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Value(Value::Number(value.into()))
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        match serde_json::Number::from_f64(value) {
            Some(number) => ArgValue::Value(Value::Number(number)),
            None => ArgValue::NonFinite(value),
        }
    }
}

impl From<Reference> for ArgValue {
    fn from(reference: Reference) -> Self {
        ArgValue::Reference(reference)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(items: Vec<T>) -> Self {
        ArgValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ArgValue::Value(Value::Null), Into::into)
    }
}

/// An object handle passed as an argument.
///
/// It carries the handle's own chain. Resolving it executes `id` on that chain once; the
/// result is shared by every copy of the reference, so forks of a chain never fetch the
/// same id twice.
#[derive(Clone)]
pub struct Reference {
    type_name: String,
    context: QueryContext,
    resolved: Arc<OnceCell<Value>>,
}

impl Reference {
    pub(crate) fn new(type_name: impl Into<String>, context: QueryContext) -> Self {
        Self {
            type_name: type_name.into(),
            context,
            resolved: Default::default(),
        }
    }

    /// The GraphQL type of the referenced object.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Fetches the identifier of the referenced object.
    ///
    /// Boxed because executing the reference's chain may itself resolve references.
    pub(crate) fn resolve(&self) -> BoxFuture<'_, Result<Value, Error>> {
        async move {
            let id = self
                .resolved
                .get_or_try_init(|| async {
                    let id: String = self
                        .context
                        .select(&self.type_name, "id", Vec::new())
                        .execute()
                        .await?;
                    Ok::<_, Error>(Value::String(ByteString::from(id)))
                })
                .await?;
            Ok(id.clone())
        }
        .boxed()
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("type_name", &self.type_name)
            .field("path", &self.context.path())
            .field("resolved", &self.resolved.get())
            .finish()
    }
}
