//! Schema building: SDL in, an executable `async_graphql` dynamic schema out,
//! with directive wirings applied to each field's resolver on the way.

pub mod sdl;
pub mod types;

use async_graphql::dynamic::{
    self, DynamicRequest, Enum, EnumItem, Field, FieldFuture, InputObject, InputValue, Object,
    ResolverContext, Scalar, TypeRef,
};
use async_graphql::{Pos, Response};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::GuardError;
use crate::resolver::{property_resolver, resolver_fn, FieldResolver};
use crate::tracer::ExecutionTracer;

pub use types::{named_type, object_type_name, type_ref, FieldDirective};

/// Schema-build hook invoked for every field carrying the directive it was
/// registered under.
pub trait SchemaDirectiveWiring: Send + Sync {
    /// Returns the resolver to install for `field`: `original` itself, or a
    /// resolver wrapping it.
    fn on_field(
        &self,
        field: &FieldDefinition,
        parent_type: &str,
        original: FieldResolver,
    ) -> Result<FieldResolver, GuardError>;
}

#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: TypeRef,
    /// Where the field is declared in the SDL
    pub location: Pos,
    pub directives: Vec<FieldDirective>,
}

impl FieldDefinition {
    pub fn directive(&self, name: &str) -> Option<&FieldDirective> {
        self.directives.iter().find(|d| d.name == name)
    }
}

/// Immutable after `SchemaBuilder::build`.
#[derive(Clone)]
pub struct Schema {
    inner: dynamic::Schema,
    query_type: String,
    mutation_type: Option<String>,
    resolvers: Arc<HashMap<(String, String), FieldResolver>>,
    field_directives: Arc<Vec<FieldDirective>>,
}

impl Schema {
    pub async fn execute(&self, request: impl Into<DynamicRequest>) -> Response {
        self.inner.execute(request).await
    }

    pub fn query_type(&self) -> &str {
        &self.query_type
    }

    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_deref()
    }

    /// Resolver installed for `type_name.field_name`, after wiring.
    pub fn resolver(&self, type_name: &str, field_name: &str) -> Option<&FieldResolver> {
        self.resolvers
            .get(&(type_name.to_string(), field_name.to_string()))
    }

    /// Every directive applied to a field, in declaration order.
    pub fn field_directives(&self) -> &[FieldDirective] {
        &self.field_directives
    }

    pub fn sdl(&self) -> String {
        self.inner.sdl()
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.query_type)
            .field("mutation_type", &self.mutation_type)
            .field("field_directives", &self.field_directives)
            .finish_non_exhaustive()
    }
}

fn input_value(argument: sdl::ParsedArgument) -> InputValue {
    let value = InputValue::new(argument.name, argument.ty);
    match argument.default {
        Some(default) => value.default_value(default),
        None => value,
    }
}

pub struct SchemaBuilder {
    parsed: sdl::ParsedSchema,
    resolvers: HashMap<(String, String), FieldResolver>,
    wirings: Vec<(String, Arc<dyn SchemaDirectiveWiring>)>,
    tracer: Option<ExecutionTracer>,
}

impl SchemaBuilder {
    pub fn from_sdl(sdl: &str) -> Result<Self, GuardError> {
        Ok(Self {
            parsed: sdl::parse_sdl(sdl)?,
            resolvers: HashMap::new(),
            wirings: Vec::new(),
            tracer: None,
        })
    }

    /// Registers the resolver for `type_name.field_name`.
    pub fn resolver<F>(self, type_name: &str, field_name: &str, resolver: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        self.field_resolver(type_name, field_name, resolver_fn(resolver))
    }

    pub fn field_resolver(
        mut self,
        type_name: &str,
        field_name: &str,
        resolver: FieldResolver,
    ) -> Self {
        self.resolvers
            .insert((type_name.to_string(), field_name.to_string()), resolver);
        self
    }

    /// Registers a wiring for fields annotated with `@<name>`.
    pub fn directive(mut self, name: &str, wiring: Arc<dyn SchemaDirectiveWiring>) -> Self {
        self.wirings.push((name.to_string(), wiring));
        self
    }

    /// Times resolvers and whole executions; `None` leaves execution untouched.
    pub fn tracer(mut self, tracer: Option<ExecutionTracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn build(mut self) -> Result<Schema, GuardError> {
        let query_type = self
            .parsed
            .query_type
            .clone()
            .unwrap_or_else(|| "Query".to_string());
        if !self.parsed.is_object(&query_type) {
            return Err(GuardError::Schema(format!(
                "root query type `{query_type}` is not defined"
            )));
        }
        let mutation_type = match self.parsed.mutation_type.clone() {
            Some(name) => Some(name),
            None if self.parsed.is_object("Mutation") => Some("Mutation".to_string()),
            None => None,
        };

        for (type_name, field_name) in self.resolvers.keys() {
            let declared = self
                .parsed
                .objects
                .iter()
                .find(|o| &o.name == type_name)
                .is_some_and(|o| o.fields.iter().any(|f| &f.name == field_name));
            if !declared {
                return Err(GuardError::Schema(format!(
                    "resolver registered for undeclared field `{type_name}.{field_name}`"
                )));
            }
        }

        let mut builder = dynamic::Schema::build(&query_type, mutation_type.as_deref(), None);
        for scalar in std::mem::take(&mut self.parsed.scalars) {
            builder = builder.register(Scalar::new(scalar));
        }
        for parsed_enum in std::mem::take(&mut self.parsed.enums) {
            let enum_type = parsed_enum
                .values
                .into_iter()
                .fold(Enum::new(parsed_enum.name), |enum_type, value| {
                    enum_type.item(EnumItem::new(value))
                });
            builder = builder.register(enum_type);
        }
        for input in std::mem::take(&mut self.parsed.inputs) {
            let object = input
                .fields
                .into_iter()
                .fold(InputObject::new(input.name), |object, field| {
                    object.field(input_value(field))
                });
            builder = builder.register(object);
        }

        let object_names: HashSet<String> =
            self.parsed.objects.iter().map(|o| o.name.clone()).collect();
        let mut installed = HashMap::new();
        let mut field_directives = Vec::new();
        let mut wired = 0usize;
        let mut seen = HashSet::new();

        for parsed_object in std::mem::take(&mut self.parsed.objects) {
            let mut object = Object::new(parsed_object.name.clone());

            for parsed_field in parsed_object.fields {
                if !seen.insert((parsed_object.name.clone(), parsed_field.name.clone())) {
                    return Err(GuardError::Schema(format!(
                        "field `{}.{}` is declared twice",
                        parsed_object.name, parsed_field.name
                    )));
                }
                let named = named_type(&parsed_field.ty);
                if !object_names.contains(named) && !self.parsed.leaf_types.contains(named) {
                    return Err(GuardError::Schema(format!(
                        "field `{}.{}` refers to unknown type `{}`",
                        parsed_object.name, parsed_field.name, named
                    )));
                }

                let key = (parsed_object.name.clone(), parsed_field.name.clone());
                let registered = self.resolvers.remove(&key);
                let mut trivial = registered.is_none();
                let mut resolver =
                    registered.unwrap_or_else(|| property_resolver(parsed_field.name.clone()));

                let definition = FieldDefinition {
                    name: parsed_field.name,
                    ty: parsed_field.ty,
                    location: parsed_field.location,
                    directives: parsed_field.directives,
                };

                for (directive_name, wiring) in &self.wirings {
                    if definition.directive(directive_name).is_some() {
                        resolver = wiring.on_field(&definition, &parsed_object.name, resolver)?;
                        trivial = false;
                        wired += 1;
                    }
                }
                if let (Some(tracer), false) = (&self.tracer, trivial) {
                    resolver = tracer.instrument(&parsed_object.name, &definition.name, resolver);
                }

                installed.insert(key, resolver.clone());
                let field = parsed_field.arguments.into_iter().fold(
                    Field::new(definition.name.clone(), definition.ty.clone(), move |ctx| {
                        resolver(ctx)
                    }),
                    |field, argument| field.argument(input_value(argument)),
                );
                object = object.field(field);
                field_directives.extend(definition.directives);
            }

            builder = builder.register(object);
        }

        if let Some(tracer) = self.tracer.take() {
            builder = builder.extension(tracer);
        }
        let inner = builder
            .finish()
            .map_err(|err| GuardError::Schema(err.to_string()))?;

        tracing::info!(
            types = object_names.len(),
            directives = field_directives.len(),
            wired,
            "Built schema"
        );

        Ok(Schema {
            inner,
            query_type,
            mutation_type,
            resolvers: Arc::new(installed),
            field_directives: Arc::new(field_directives),
        })
    }
}
