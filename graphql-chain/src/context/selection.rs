use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::executable;
use apollo_compiler::executable::Selection;
use apollo_compiler::schema::ExtendedType;
use indexmap::IndexMap;

use super::arg::ArgValue;
use crate::error::Error;
use crate::json_ext::Value;

/// One field selection of a chain.
///
/// Nodes are never modified once they are part of a chain: [`Field::add_child`] returns a
/// new node.
#[derive(Clone, Debug)]
pub(crate) struct Field {
    pub(crate) type_name: String,
    pub(crate) name: String,
    /// Encoded arguments, in the order they were given.
    pub(crate) args: IndexMap<String, ArgValue>,
    /// Sub-selections keyed by response alias.
    pub(crate) children: IndexMap<String, Field>,
}

impl Field {
    pub(crate) fn new(
        type_name: impl Into<String>,
        name: impl Into<String>,
        args: IndexMap<String, ArgValue>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            args,
            children: IndexMap::new(),
        }
    }

    /// Returns a copy of this node whose only child is `child`.
    pub(crate) fn add_child(&self, child: Field) -> Field {
        let mut field = self.clone();
        field.children = IndexMap::from([(child.name.clone(), child)]);
        field
    }

    /// Renders this node and its children as an executable field.
    pub(crate) fn to_wire(&self, schema: &Schema) -> Result<executable::Field, Error> {
        let definition = schema
            .type_field(&self.type_name, &self.name)
            .map_err(|_| Error::InvalidQuery {
                reason: format!(
                    "field '{}' is not defined on type '{}'",
                    self.name, self.type_name
                ),
            })?;

        let mut field = executable::Field::new(name(&self.name)?, definition.node.clone());
        for (arg_name, value) in &self.args {
            let Some(argument) = definition.argument_by_name(arg_name) else {
                return Err(Error::InvalidQuery {
                    reason: format!(
                        "field '{}.{}' has no argument '{arg_name}'",
                        self.type_name, self.name
                    ),
                });
            };
            field = field.with_argument(
                argument.name.clone(),
                Node::new(wire_value(value, &argument.ty, schema)?),
            );
        }

        for (alias, child) in &self.children {
            let mut child_field = child.to_wire(schema)?;
            if *alias != child.name {
                child_field = child_field.with_alias(name(alias)?);
            }
            field
                .selection_set
                .push(Selection::Field(Node::new(child_field)));
        }

        Ok(field)
    }
}

fn name(value: &str) -> Result<Name, Error> {
    Name::new(value).map_err(|err| Error::InvalidQuery {
        reason: err.to_string(),
    })
}

fn wire_value(value: &ArgValue, ty: &ast::Type, schema: &Schema) -> Result<ast::Value, Error> {
    match value {
        ArgValue::Value(value) => json_to_ast(value, ty, schema),
        ArgValue::Input(fields) => json_to_ast(&Value::Object(fields.clone()), ty, schema),
        ArgValue::List(items) => Ok(ast::Value::List(
            items
                .iter()
                .map(|item| wire_value(item, ty.item_type(), schema).map(Node::new))
                .collect::<Result<_, _>>()?,
        )),
        ArgValue::NonFinite(value) => Err(Error::InvalidQuery {
            reason: format!("{value} cannot be sent as a GraphQL float"),
        }),
        ArgValue::Reference(reference) => Err(Error::InvalidQuery {
            reason: format!(
                "reference to a '{}' was not resolved before compilation",
                reference.type_name()
            ),
        }),
    }
}

/// Converts a JSON value to a GraphQL literal of type `ty`.
fn json_to_ast(value: &Value, ty: &ast::Type, schema: &Schema) -> Result<ast::Value, Error> {
    Ok(match value {
        Value::Null => ast::Value::Null,
        Value::Bool(b) => ast::Value::Boolean(*b),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) => ast::Value::Float(f.into()),
            None => ast::Value::Null,
        },
        Value::Number(n) => ast::Value::Int(ast::IntValue::new_parsed(&n.to_string())),
        Value::String(s) => match schema.types.get(ty.inner_named_type()) {
            Some(ExtendedType::Enum(_)) => ast::Value::Enum(name(s.as_str())?),
            _ => ast::Value::String(s.as_str().to_string()),
        },
        Value::Array(items) => ast::Value::List(
            items
                .iter()
                .map(|item| json_to_ast(item, ty.item_type(), schema).map(Node::new))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(fields) => {
            let type_name = ty.inner_named_type();
            let Some(input) = schema.get_input_object(type_name.as_str()) else {
                return Err(Error::InvalidQuery {
                    reason: format!("'{type_name}' is not an input type"),
                });
            };
            let mut object = Vec::with_capacity(fields.len());
            for (key, field_value) in fields {
                let Some(definition) = input
                    .fields
                    .values()
                    .find(|definition| definition.name.as_str() == key.as_str())
                else {
                    return Err(Error::InvalidQuery {
                        reason: format!(
                            "input type '{type_name}' has no field '{}'",
                            key.as_str()
                        ),
                    });
                };
                object.push((
                    definition.name.clone(),
                    Node::new(json_to_ast(field_value, &definition.ty, schema)?),
                ));
            }
            ast::Value::Object(object)
        }
    })
}

#[cfg(test)]
mod tests {
    use apollo_compiler::validation::Valid;
    use serde_json_bytes::json;

    use super::*;

    fn schema() -> Valid<Schema> {
        Schema::parse_and_validate(
            include_str!("../../tests/fixtures/schema.graphql"),
            "schema.graphql",
        )
        .unwrap()
    }

    fn args(entries: Vec<(&str, ArgValue)>) -> IndexMap<String, ArgValue> {
        entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.into_input()))
            .collect()
    }

    fn render(field: &Field) -> String {
        let mut selection_set =
            executable::SelectionSet::new(Name::new(&field.type_name).unwrap());
        selection_set.push(Selection::Field(Node::new(
            field.to_wire(&schema()).unwrap(),
        )));
        selection_set.serialize().no_indent().to_string()
    }

    #[test]
    fn test_add_child_replaces_children() {
        let parent = Field::new("Query", "container", IndexMap::new());
        let first = parent.add_child(Field::new("Container", "stdout", IndexMap::new()));
        let second = first.add_child(Field::new("Container", "stderr", IndexMap::new()));

        assert!(parent.children.is_empty());
        assert_eq!(first.children.keys().collect::<Vec<_>>(), ["stdout"]);
        assert_eq!(second.children.keys().collect::<Vec<_>>(), ["stderr"]);
    }

    #[test]
    fn test_children_are_aliased() {
        let mut field = Field::new("Query", "container", IndexMap::new());
        field.children.insert(
            "out".to_string(),
            Field::new("Container", "stdout", IndexMap::new()),
        );

        insta::assert_snapshot!(render(&field), @"{ container { out: stdout } }");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let error = Field::new("Container", "stdot", IndexMap::new())
            .to_wire(&schema())
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid query: field 'stdot' is not defined on type 'Container'"
        );
    }

    #[test]
    fn test_unknown_argument_is_rejected() {
        let error = Field::new("Container", "from", args(vec![("img", "alpine".into())]))
            .to_wire(&schema())
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid query: field 'Container.from' has no argument 'img'"
        );
    }

    #[test]
    fn test_unknown_input_field_is_rejected() {
        let error = Field::new(
            "Container",
            "build",
            args(vec![
                ("context", "dir-id".into()),
                ("buildArgs", json!([{"key": "A"}]).into()),
            ]),
        )
        .to_wire(&schema())
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid query: input type 'BuildArg' has no field 'key'"
        );
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        let error = Field::new(
            "Container",
            "withExposedPort",
            args(vec![("port", f64::INFINITY.into())]),
        )
        .to_wire(&schema())
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid query: inf cannot be sent as a GraphQL float"
        );
    }
}
