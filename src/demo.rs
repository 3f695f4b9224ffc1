//! Sample schema served by the binary.

use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use async_graphql::value;
use std::sync::Arc;

use crate::authz::{SecuredDirectiveWiring, TokenValidator, SECURED_DIRECTIVE};
use crate::errors::GuardError;
use crate::schema::{Schema, SchemaBuilder};
use crate::tracer::ExecutionTracer;

pub const DEMO_SDL: &str = r#"directive @secured(requires: String) on FIELD_DEFINITION

type Query {
  publicData: String
  secretData: String @secured(requires: "ADMIN")
  shows(titleFilter: String): [Show!]!
}

type Show {
  title: String!
  releaseYear: Int
  budget: Int @secured(requires: "FINANCE")
}
"#;

const CATALOGUE: [(&str, i32, i32); 4] = [
    ("Stranger Things", 2016, 30_000_000),
    ("Ozark", 2017, 20_000_000),
    ("The Crown", 2016, 130_000_000),
    ("Dead to Me", 2019, 5_000_000),
];

fn public_data(_ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::Value(Some(FieldValue::value("Everyone can see this")))
}

fn secret_data(_ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    FieldFuture::Value(Some(FieldValue::value("The launch code is 0000")))
}

fn shows(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    let filter = ctx
        .args
        .get("titleFilter")
        .and_then(|v| v.string().ok().map(str::to_lowercase));
    FieldFuture::new(async move {
        let shows = CATALOGUE
            .iter()
            .filter(|(title, _, _)| {
                filter
                    .as_deref()
                    .map_or(true, |f| title.to_lowercase().contains(f))
            })
            .map(|(title, year, budget)| {
                FieldValue::value(value!({
                    "title": *title,
                    "releaseYear": *year,
                    "budget": *budget
                }))
            })
            .collect::<Vec<_>>();
        Ok(Some(FieldValue::list(shows)))
    })
}

pub fn schema(
    validator: Arc<dyn TokenValidator>,
    tracer: Option<ExecutionTracer>,
) -> Result<Schema, GuardError> {
    SchemaBuilder::from_sdl(DEMO_SDL)?
        .resolver("Query", "publicData", public_data)
        .resolver("Query", "secretData", secret_data)
        .resolver("Query", "shows", shows)
        .directive(
            SECURED_DIRECTIVE,
            Arc::new(SecuredDirectiveWiring::new(validator)),
        )
        .tracer(tracer)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DenyAll;

    impl TokenValidator for DenyAll {
        fn validate(&self, _role: Option<&str>, _credential: Option<&str>) -> bool {
            false
        }
    }

    #[test]
    fn test_demo_schema_builds() {
        let schema = schema(Arc::new(DenyAll), None).unwrap();
        assert_eq!(schema.field_directives().len(), 2);
        assert!(schema.resolver("Show", "budget").is_some());
        assert!(schema.sdl().contains("budget: Int"));
    }
}
