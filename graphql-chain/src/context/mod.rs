//! Lazy query chains.
//!
//! A [`QueryContext`] is an ordered path of field selections starting at the root type.
//! Extending a chain returns a new context and leaves the original untouched, so any
//! context can be forked and extended independently. Nothing is sent to the engine until
//! one of the executing methods is awaited.

use std::fmt;
use std::sync::Arc;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::executable;
use apollo_compiler::executable::Selection;
use apollo_compiler::validation::Valid;
use indexmap::IndexMap;

use crate::configuration::Configuration;
use crate::error::Error;
use crate::session::Session;

mod arg;
mod decode;
mod executor;
mod resolver;
mod selection;

pub use self::arg::Arg;
pub use self::arg::ArgValue;
pub use self::arg::Reference;
pub use self::decode::FromResponse;
pub use self::decode::Json;
pub use self::decode::ObjectHandle;
pub use self::decode::structure;
pub use self::decode::structure_handle;
use self::selection::Field;

const DEFAULT_QUERY_TYPE: &str = "Query";

/// A chain of field selections bound to a session.
#[derive(Clone)]
pub struct QueryContext {
    session: Arc<dyn Session>,
    schema: Arc<Valid<Schema>>,
    selections: Vec<Arc<Field>>,
    configuration: Arc<Configuration>,
}

impl QueryContext {
    /// Creates an empty chain.
    pub fn new(
        session: Arc<dyn Session>,
        schema: Arc<Valid<Schema>>,
        configuration: Arc<Configuration>,
    ) -> Self {
        Self {
            session,
            schema,
            selections: Vec::new(),
            configuration,
        }
    }

    /// Returns a new chain that selects `field_name` on `type_name` after the current path.
    ///
    /// Arguments equal to their declared default are dropped.
    pub fn select(
        &self,
        type_name: &str,
        field_name: &str,
        args: impl IntoIterator<Item = Arg>,
    ) -> Self {
        let args = args.into_iter().filter_map(Arg::into_input).collect();
        let mut context = self.clone();
        context
            .selections
            .push(Arc::new(Field::new(type_name, field_name, args)));
        context
    }

    /// Returns a new chain that selects several leaf fields of the last selection.
    ///
    /// `fields` maps response aliases to field names of `type_name`. Any sub-selection of
    /// the last node is replaced.
    pub fn select_multiple<A, F>(
        &self,
        type_name: &str,
        fields: impl IntoIterator<Item = (A, F)>,
    ) -> Result<Self, Error>
    where
        A: Into<String>,
        F: Into<String>,
    {
        let mut context = self.clone();
        let last = context
            .selections
            .pop()
            .ok_or_else(Error::no_field_selected)?;
        let mut last = Arc::unwrap_or_clone(last);
        last.children = fields
            .into_iter()
            .map(|(alias, field)| {
                let alias: String = alias.into();
                (alias, Field::new(type_name, field, IndexMap::new()))
            })
            .collect();
        context.selections.push(Arc::new(last));
        Ok(context)
    }

    /// Renders the chain as a single root field, each selection nested in its predecessor.
    pub fn build(&self) -> Result<executable::Field, Error> {
        let root = self
            .selections
            .iter()
            .rev()
            .fold(None, |child: Option<Field>, field| {
                Some(match child {
                    Some(child) => field.add_child(child),
                    None => Field::clone(field),
                })
            })
            .ok_or_else(Error::no_field_selected)?;
        root.to_wire(&self.schema)
    }

    /// Renders the chain as an anonymous query document.
    pub fn query(&self) -> Result<ExecutableDocument, Error> {
        let field = self.build()?;
        let root_type = self.root_type();
        let mut selection_set =
            executable::SelectionSet::new(Name::new(root_type).map_err(|err| {
                Error::InvalidQuery {
                    reason: err.to_string(),
                }
            })?);
        selection_set.push(Selection::Field(field.into()));

        let mut document = ExecutableDocument::new();
        document.operations.insert(executable::Operation {
            operation_type: executable::OperationType::Query,
            name: None,
            variables: vec![],
            directives: ast::DirectiveList(vec![]),
            selection_set,
        });
        Ok(document)
    }

    /// Field names of the chain, from the root.
    pub fn path(&self) -> Vec<&str> {
        self.selections
            .iter()
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Number of selections in the chain.
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// The schema the chain is compiled against.
    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// A chain bound to the same session, with no selections.
    pub fn with_empty_selections(&self) -> Self {
        Self {
            selections: Vec::new(),
            ..self.clone()
        }
    }

    /// Name of the query root type.
    pub fn root_type(&self) -> &str {
        self.schema
            .schema_definition
            .query
            .as_ref()
            .map(|name| name.name.as_str())
            .unwrap_or(DEFAULT_QUERY_TYPE)
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("path", &self.path())
            .field("configuration", &self.configuration)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_harness::MockSession;

    pub(crate) fn schema() -> Arc<Valid<Schema>> {
        Arc::new(
            Schema::parse_and_validate(
                include_str!("../../tests/fixtures/schema.graphql"),
                "schema.graphql",
            )
            .unwrap(),
        )
    }

    pub(crate) fn context(session: MockSession) -> QueryContext {
        QueryContext::new(
            Arc::new(session),
            schema(),
            Arc::new(Configuration::default()),
        )
    }

    fn normalize(query: &str) -> String {
        ExecutableDocument::parse(&schema(), query, "expected.graphql")
            .unwrap()
            .serialize()
            .no_indent()
            .to_string()
    }

    fn compiled(context: &QueryContext) -> String {
        context.query().unwrap().serialize().no_indent().to_string()
    }

    #[test]
    fn test_select_appends_without_mutating() {
        let root = context(MockSession::new());
        let container = root.select("Query", "container", []);
        let alpine = container.select("Container", "from", [Arg::new("image", "alpine")]);
        let ubuntu = container.select("Container", "from", [Arg::new("image", "ubuntu")]);

        assert!(root.is_empty());
        assert_eq!(container.len(), 1);
        assert_eq!(alpine.len(), 2);
        assert_eq!(alpine.path(), ["container", "from"]);

        let alpine = alpine.select("Container", "id", []);
        let ubuntu = ubuntu.select("Container", "id", []);
        assert_eq!(
            compiled(&alpine),
            normalize(r#"{ container { from(image: "alpine") { id } } }"#)
        );
        assert_eq!(
            compiled(&ubuntu),
            normalize(r#"{ container { from(image: "ubuntu") { id } } }"#)
        );
    }

    #[test]
    fn test_empty_chain_cannot_be_built() {
        let error = context(MockSession::new()).build().unwrap_err();
        assert_eq!(error.to_string(), "invalid query: no field has been selected");
    }

    #[test]
    fn test_select_multiple_replaces_sub_selection() {
        let exec = context(MockSession::new())
            .select("Query", "container", [])
            .select(
                "Container",
                "withExec",
                [Arg::new("args", vec!["echo", "hello"])],
            );

        let outputs = exec
            .select_multiple("Container", [("a", "stdout"), ("b", "stderr")])
            .unwrap();
        assert_eq!(outputs.len(), exec.len());
        assert_eq!(
            compiled(&outputs),
            normalize(r#"{ container { withExec(args: ["echo", "hello"]) { a: stdout b: stderr } } }"#)
        );

        let replaced = outputs
            .select_multiple("Container", [("exitCode", "exitCode")])
            .unwrap();
        assert_eq!(
            compiled(&replaced),
            normalize(r#"{ container { withExec(args: ["echo", "hello"]) { exitCode } } }"#)
        );
    }

    #[test]
    fn test_select_multiple_needs_a_selection() {
        let error = context(MockSession::new())
            .select_multiple("Container", [("stdout", "stdout")])
            .unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::Construction);
    }

    #[test]
    fn test_default_arguments_are_omitted() {
        let chain = context(MockSession::new())
            .select("Query", "container", [Arg::optional::<&str>("platform", None)])
            .select(
                "Container",
                "withExec",
                [
                    Arg::new("args", vec!["ls"]),
                    Arg::with_default("skipEntrypoint", false, false),
                ],
            )
            .select("Container", "stdout", []);

        assert_eq!(
            compiled(&chain),
            normalize(r#"{ container { withExec(args: ["ls"]) { stdout } } }"#)
        );
    }

    #[test]
    fn test_arguments_are_coerced_by_schema_type() {
        let chain = context(MockSession::new())
            .select("Query", "container", [])
            .select(
                "Container",
                "withExposedPort",
                [Arg::new("port", 8080i32), Arg::new("protocol", "UDP")],
            )
            .select("Container", "id", []);

        assert_eq!(
            compiled(&chain),
            normalize("{ container { withExposedPort(port: 8080, protocol: UDP) { id } } }")
        );
    }

    #[test]
    fn test_input_objects_are_rendered_as_literals() {
        #[derive(serde::Serialize)]
        struct BuildArg {
            name: &'static str,
            value: &'static str,
        }

        let build_args = vec![
            ArgValue::input(&BuildArg {
                name: "NODE_ENV",
                value: "production",
            })
            .unwrap(),
        ];
        let chain = context(MockSession::new())
            .select("Query", "container", [])
            .select(
                "Container",
                "build",
                [
                    Arg::new("context", "dir-id"),
                    Arg::optional("buildArgs", Some(build_args)),
                ],
            )
            .select("Container", "id", []);

        assert_eq!(
            compiled(&chain),
            normalize(
                r#"{ container { build(context: "dir-id", buildArgs: [{name: "NODE_ENV", value: "production"}]) { id } } }"#
            )
        );
    }

    #[test]
    fn test_query_is_rendered_on_the_root_type() {
        let chain = context(MockSession::new())
            .select("Query", "container", [])
            .select("Container", "from", [Arg::new("image", "alpine")])
            .select("Container", "id", []);

        insta::assert_snapshot!(
            compiled(&chain),
            @r#"{ container { from(image: "alpine") { id } } }"#
        );
    }

    #[test]
    fn test_empty_selections_keep_session() {
        let chain = context(MockSession::new()).select("Query", "container", []);
        let root = chain.with_empty_selections();
        assert!(root.is_empty());
        assert!(Arc::ptr_eq(&root.session, &chain.session));
        assert_eq!(root.root_type(), "Query");
    }
}
