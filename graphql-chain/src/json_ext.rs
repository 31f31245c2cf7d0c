//! JSON types carried through a query chain.

/// A JSON value, as found in arguments and responses.
pub type Value = serde_json_bytes::Value;

/// A JSON object.
pub type Object = serde_json_bytes::Map<serde_json_bytes::ByteString, Value>;

pub(crate) trait ValueExt {
    /// Name of the JSON kind of this value, for error messages.
    fn kind_name(&self) -> &'static str;
}

impl ValueExt for Value {
    fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}
