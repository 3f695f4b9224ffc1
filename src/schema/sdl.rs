use async_graphql::dynamic::TypeRef;
use async_graphql::Pos;
use async_graphql_parser::types::{InputValueDefinition, TypeKind, TypeSystemDefinition};
use async_graphql_parser::Positioned;
use async_graphql_value::ConstValue;
use std::collections::{BTreeMap, HashSet};

use crate::errors::GuardError;
use crate::schema::types::{type_ref, FieldDirective};

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Types read from an SDL document, before any wiring.
#[derive(Debug, Default)]
pub(crate) struct ParsedSchema {
    pub objects: Vec<ParsedObject>,
    pub scalars: Vec<String>,
    pub enums: Vec<ParsedEnum>,
    pub inputs: Vec<ParsedInput>,
    pub leaf_types: HashSet<String>,
    pub query_type: Option<String>,
    pub mutation_type: Option<String>,
}

#[derive(Debug)]
pub(crate) struct ParsedObject {
    pub name: String,
    pub fields: Vec<ParsedField>,
}

#[derive(Debug)]
pub(crate) struct ParsedField {
    pub name: String,
    pub ty: TypeRef,
    pub arguments: Vec<ParsedArgument>,
    pub location: Pos,
    pub directives: Vec<FieldDirective>,
}

#[derive(Debug)]
pub(crate) struct ParsedArgument {
    pub name: String,
    pub ty: TypeRef,
    pub default: Option<ConstValue>,
}

#[derive(Debug)]
pub(crate) struct ParsedEnum {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct ParsedInput {
    pub name: String,
    pub fields: Vec<ParsedArgument>,
}

impl ParsedSchema {
    pub fn object_mut(&mut self, name: &str) -> Option<&mut ParsedObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    pub fn is_object(&self, name: &str) -> bool {
        self.objects.iter().any(|o| o.name == name)
    }
}

fn parse_arguments(values: &[Positioned<InputValueDefinition>]) -> Vec<ParsedArgument> {
    values
        .iter()
        .map(|value| ParsedArgument {
            name: value.node.name.node.to_string(),
            ty: type_ref(&value.node.ty.node),
            default: value.node.default_value.as_ref().map(|v| v.node.clone()),
        })
        .collect()
}

pub(crate) fn parse_sdl(sdl: &str) -> Result<ParsedSchema, GuardError> {
    let document = async_graphql_parser::parse_schema(sdl)?;
    let mut parsed = ParsedSchema {
        leaf_types: BUILTIN_SCALARS.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };

    for definition in document.definitions {
        match definition {
            TypeSystemDefinition::Schema(schema) => {
                if let Some(query) = &schema.node.query {
                    parsed.query_type = Some(query.node.to_string());
                }
                if let Some(mutation) = &schema.node.mutation {
                    parsed.mutation_type = Some(mutation.node.to_string());
                }
                if schema.node.subscription.is_some() {
                    return Err(GuardError::Schema(
                        "subscriptions are not supported".to_string(),
                    ));
                }
            }
            TypeSystemDefinition::Type(ty) => {
                let type_name = ty.node.name.node.to_string();
                match &ty.node.kind {
                    TypeKind::Object(object) => {
                        let fields = object
                            .fields
                            .iter()
                            .map(|field| {
                                let name = field.node.name.node.to_string();
                                let directives = field
                                    .node
                                    .directives
                                    .iter()
                                    .map(|directive| FieldDirective {
                                        parent_type: type_name.clone(),
                                        field_name: name.clone(),
                                        name: directive.node.name.node.to_string(),
                                        arguments: directive
                                            .node
                                            .arguments
                                            .iter()
                                            .map(|(arg, value)| {
                                                (arg.node.to_string(), value.node.clone())
                                            })
                                            .collect::<BTreeMap<_, _>>(),
                                        location: directive.pos,
                                    })
                                    .collect();
                                ParsedField {
                                    name,
                                    ty: type_ref(&field.node.ty.node),
                                    arguments: parse_arguments(&field.node.arguments),
                                    location: field.pos,
                                    directives,
                                }
                            })
                            .collect::<Vec<_>>();

                        // `extend type` merges into an earlier declaration
                        match parsed.object_mut(&type_name) {
                            Some(existing) => existing.fields.extend(fields),
                            None => parsed.objects.push(ParsedObject {
                                name: type_name,
                                fields,
                            }),
                        }
                    }
                    TypeKind::Scalar => {
                        parsed.leaf_types.insert(type_name.clone());
                        parsed.scalars.push(type_name);
                    }
                    TypeKind::Enum(enum_type) => {
                        parsed.leaf_types.insert(type_name.clone());
                        parsed.enums.push(ParsedEnum {
                            name: type_name,
                            values: enum_type
                                .values
                                .iter()
                                .map(|v| v.node.value.node.to_string())
                                .collect(),
                        });
                    }
                    TypeKind::InputObject(input) => parsed.inputs.push(ParsedInput {
                        name: type_name,
                        fields: parse_arguments(&input.fields),
                    }),
                    TypeKind::Interface(_) | TypeKind::Union(_) => {
                        return Err(GuardError::Schema(format!(
                            "abstract type `{type_name}` is not supported"
                        )));
                    }
                }
            }
            TypeSystemDefinition::Directive(_) => {}
        }
    }

    Ok(parsed)
}
