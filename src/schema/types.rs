use async_graphql::dynamic::TypeRef;
use async_graphql::Pos;
use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::ConstValue;
use std::collections::BTreeMap;

use crate::errors::GuardError;

/// Converts a parsed SDL type into the dynamic schema's type reference,
/// keeping list and non-null wrappers.
pub fn type_ref(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::named(name.to_string()),
        BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };
    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

/// Innermost named type, through every wrapper.
pub fn named_type(ty: &TypeRef) -> &str {
    match ty {
        TypeRef::Named(name) => &**name,
        TypeRef::List(inner) | TypeRef::NonNull(inner) => named_type(inner),
    }
}

/// Object type name behind at most one non-null wrapper, as rendered in
/// type strings (`Show!` becomes `Show`).
pub fn object_type_name(type_name: &str) -> &str {
    type_name.strip_suffix('!').unwrap_or(type_name)
}

/// A directive applied to a field, captured once while the schema is built.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDirective {
    pub parent_type: String,
    pub field_name: String,
    pub name: String,
    pub arguments: BTreeMap<String, ConstValue>,
    pub location: Pos,
}

impl FieldDirective {
    /// Literal string argument; `Ok(None)` when absent or null.
    pub fn string_argument(&self, name: &str) -> Result<Option<&str>, GuardError> {
        match self.arguments.get(name) {
            None | Some(ConstValue::Null) => Ok(None),
            Some(ConstValue::String(value)) => Ok(Some(value)),
            Some(other) => Err(GuardError::Schema(format!(
                "argument `{name}` of @{} on {}.{} must be a string, found {other}",
                self.name, self.parent_type, self.field_name
            ))),
        }
    }
}
