//! Field resolvers as installed on the dynamic schema. Business code, the
//! authorization guard and the tracer all produce the same function type.

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use async_graphql::Value;
use std::sync::Arc;

/// A field resolver that can be shared, wrapped and installed.
pub type FieldResolver =
    Arc<dyn for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync>;

pub fn resolver_fn<F>(f: F) -> FieldResolver
where
    F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Default resolver for fields without a registered one: reads the
/// same-named entry of the parent object value.
pub fn property_resolver(field_name: impl Into<String>) -> FieldResolver {
    let field_name = field_name.into();
    resolver_fn(move |ctx| {
        let value = match ctx.parent_value.as_value() {
            Some(Value::Object(map)) => map.get(field_name.as_str()).cloned(),
            _ => None,
        };
        FieldFuture::Value(value.and_then(into_field_value))
    })
}

/// Lifts a plain value into a field value, turning lists into list values
/// so object elements resolve their own fields. `Null` becomes `None`.
pub fn into_field_value(value: Value) -> Option<FieldValue<'static>> {
    match value {
        Value::Null => None,
        Value::List(items) => Some(FieldValue::list(
            items
                .into_iter()
                .map(|item| into_field_value(item).unwrap_or(FieldValue::NULL)),
        )),
        other => Some(FieldValue::value(other)),
    }
}
