//! Types exchanged with the engine: GraphQL requests, responses and errors.

use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;

use crate::json_ext::Object;

/// A GraphQL request body, as sent over HTTP.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Request {
    /// The GraphQL document.
    pub query: String,

    /// The operation to execute, for documents with several operations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    /// The variable values.
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub variables: Object,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// A GraphQL response body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Response {
    /// The response data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// The errors reported by the service.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Error>,

    /// The optional GraphQL extensions.
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub extensions: Object,
}

/// The error location
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// The line number
    pub line: u32,
    /// The column number
    pub column: u32,
}

/// One element of the path of a field error.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(untagged)]
pub enum PathElement {
    /// An index in a list.
    Index(usize),
    /// A key in an object.
    Key(String),
}

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors)
/// as found in the `errors` field of a GraphQL [`Response`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[non_exhaustive]
pub struct Error {
    /// The error message.
    pub message: String,

    /// The locations of the error in the GraphQL document of the originating request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,

    /// If this is a field error, the path to that field in [`Response::data`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathElement>>,

    /// The optional GraphQL extensions for this error.
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Error {
    /// Returns a builder that builds a GraphQL [`Error`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.message(impl Into<`[`String`]`>)`
    ///   Required.
    ///
    /// * `.location(impl Into<`[`Location`]`>)`
    ///   Optional, may be called multiple times.
    ///
    /// * `.path(impl Into<`[`Vec`]`<`[`PathElement`]`>>)`
    ///   Optional.
    ///
    /// * `.extension(impl Into<`[`ByteString`]`>, impl Into<`[`Value`]`>)`
    ///   Optional, may be called multiple times.
    ///
    /// * `.extension_code(impl Into<`[`String`]`>)`
    ///   Optional. Sets the "code" in the extension map, unless already set.
    ///
    /// * `.build()`
    ///   Finishes the builder and returns a GraphQL [`Error`].
    #[builder(visibility = "pub")]
    fn new(
        message: String,
        locations: Vec<Location>,
        path: Option<Vec<PathElement>>,
        extension_code: Option<String>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        mut extensions: JsonMap<ByteString, Value>,
    ) -> Self {
        if let Some(code) = extension_code {
            extensions
                .entry("code")
                .or_insert(Value::String(ByteString::from(code)));
        }
        Self {
            message,
            locations,
            path,
            extensions,
        }
    }

    /// Returns the extension stored under `key`.
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// Returns the extension stored under `key` if it is a string.
    pub fn extension_str(&self, key: &str) -> Option<&str> {
        self.extension(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    #[test]
    fn test_response_deserialization() {
        let response: Response = serde_json::from_str(
            r#"{
                "data": null,
                "errors": [{
                    "message": "process \"echo\" did not complete successfully",
                    "locations": [{"line": 1, "column": 3}],
                    "path": ["container", "withExec", 0],
                    "extensions": {"_type": "EXEC_ERROR", "exitCode": 1}
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(response.data, None);
        let error = &response.errors[0];
        assert_eq!(error.locations, vec![Location { line: 1, column: 3 }]);
        assert_eq!(
            error.path,
            Some(vec![
                PathElement::Key("container".to_string()),
                PathElement::Key("withExec".to_string()),
                PathElement::Index(0),
            ])
        );
        assert_eq!(error.extension_str("_type"), Some("EXEC_ERROR"));
        assert_eq!(error.extension("exitCode"), Some(&json!(1)));
    }

    #[test]
    fn test_error_builder_keeps_existing_code() {
        let error = Error::builder()
            .message("boom")
            .extension("code", json!("ORIGINAL"))
            .extension_code("IGNORED")
            .build();

        assert_eq!(error.extension_str("code"), Some("ORIGINAL"));
    }

    #[test]
    fn test_request_serialization_skips_empty_fields() {
        let request = Request::new("{ version }");
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"query":"{ version }"}"#
        );
    }
}
