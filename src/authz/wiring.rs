use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::{PathSegment, Pos, QueryPathSegment};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::authz::cache::DecisionKey;
use crate::authz::errors::AccessDeniedError;
use crate::authz::validator::TokenValidator;
use crate::context::RequestContext;
use crate::errors::GuardError;
use crate::resolver::{resolver_fn, FieldResolver};
use crate::schema::{FieldDefinition, SchemaDirectiveWiring};

pub const SECURED_DIRECTIVE: &str = "secured";
/// Directive argument naming the role a caller must hold.
pub const REQUIRES_ATTR: &str = "requires";

/// Guards every `@secured(requires: "...")` field with a role check.
pub struct SecuredDirectiveWiring {
    validator: Arc<dyn TokenValidator>,
}

impl SecuredDirectiveWiring {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }
}

impl SchemaDirectiveWiring for SecuredDirectiveWiring {
    fn on_field(
        &self,
        field: &FieldDefinition,
        parent_type: &str,
        original: FieldResolver,
    ) -> Result<FieldResolver, GuardError> {
        let Some(directive) = field.directive(SECURED_DIRECTIVE) else {
            return Ok(original);
        };
        let required_role = directive
            .string_argument(REQUIRES_ATTR)?
            .filter(|role| !role.trim().is_empty())
            .map(str::to_owned);
        if required_role.is_none() {
            tracing::warn!(
                parent = parent_type,
                field = %field.name,
                "Secured field has no required role; it will always be denied"
            );
        }

        let guard = GuardedResolver {
            original,
            parent_type: parent_type.to_string(),
            field_name: field.name.clone(),
            directive: directive.name.clone(),
            required_role,
            location: field.location,
            validator: self.validator.clone(),
        };
        Ok(guard.into_resolver())
    }
}

/// Runs the original resolver only if the request's credential grants the
/// required role.
pub struct GuardedResolver {
    original: FieldResolver,
    parent_type: String,
    field_name: String,
    directive: String,
    required_role: Option<String>,
    /// Declaration site of the guarded field
    location: Pos,
    validator: Arc<dyn TokenValidator>,
}

impl GuardedResolver {
    pub fn into_resolver(self) -> FieldResolver {
        resolver_fn(move |ctx| self.resolve(ctx))
    }

    pub fn resolve<'a>(&self, ctx: ResolverContext<'a>) -> FieldFuture<'a> {
        if self.is_authorized(&ctx) {
            return (self.original)(ctx);
        }
        let denied = AccessDeniedError::new(vec![self.location], result_path(&ctx));
        ctx.add_error(denied.into());
        FieldFuture::Value(None)
    }

    fn is_authorized(&self, ctx: &ResolverContext<'_>) -> bool {
        let key = DecisionKey::for_field(&self.parent_type, &self.field_name, &self.directive);
        let Some(request) = ctx.data_opt::<RequestContext>() else {
            tracing::warn!(%key, "No request context attached, denying");
            return false;
        };

        request.decisions().get_or_compute(key.clone(), || {
            let Some(role) = self.required_role.as_deref() else {
                return false;
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.validator.validate(Some(role), request.credential())
            }));
            let granted = match outcome {
                Ok(granted) => granted,
                Err(_) => {
                    tracing::warn!(%key, role, "Token validator panicked, denying");
                    false
                }
            };
            if !granted {
                tracing::debug!(%key, role, "Access denied");
            }
            granted
        })
    }
}

/// Response path of the field being resolved, root first.
fn result_path(ctx: &ResolverContext<'_>) -> Vec<PathSegment> {
    let mut path = Vec::new();
    let mut node = ctx.path_node;
    while let Some(current) = node {
        path.push(match &current.segment {
            QueryPathSegment::Name(name) => PathSegment::Field(name.to_string()),
            QueryPathSegment::Index(index) => PathSegment::Index(*index),
        });
        node = current.parent.copied();
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Schema, SchemaBuilder};
    use async_graphql::dynamic::FieldValue;
    use async_graphql::{Request, Response};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Grants `ADMIN` to the credential `"admin"` and counts calls.
    #[derive(Default)]
    struct FakeValidator(AtomicUsize);

    impl TokenValidator for FakeValidator {
        fn validate(&self, role: Option<&str>, credential: Option<&str>) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            role == Some("ADMIN") && credential == Some("admin")
        }
    }

    struct ExplodingValidator;

    impl TokenValidator for ExplodingValidator {
        fn validate(&self, _role: Option<&str>, _credential: Option<&str>) -> bool {
            panic!("validator blew up");
        }
    }

    const SDL: &str = r#"
type Query {
  secretData: String @secured(requires: "ADMIN")
  blank: String @secured(requires: "")
  publicData: String
}
"#;

    fn secret(_ctx: ResolverContext<'_>) -> FieldFuture<'_> {
        FieldFuture::Value(Some(FieldValue::value("s3cr3t")))
    }

    fn public(_ctx: ResolverContext<'_>) -> FieldFuture<'_> {
        FieldFuture::Value(Some(FieldValue::value("hello")))
    }

    fn schema(validator: Arc<dyn TokenValidator>) -> Schema {
        SchemaBuilder::from_sdl(SDL)
            .unwrap()
            .resolver("Query", "secretData", secret)
            .resolver("Query", "publicData", public)
            .directive(
                SECURED_DIRECTIVE,
                Arc::new(SecuredDirectiveWiring::new(validator)),
            )
            .build()
            .unwrap()
    }

    async fn run(schema: &Schema, query: &str, credential: Option<&str>) -> Response {
        let request =
            Request::new(query).data(RequestContext::new(credential.map(str::to_owned)));
        schema.execute(request).await
    }

    #[tokio::test]
    async fn test_denied_at_declaration_site() {
        let validator = Arc::new(FakeValidator::default());
        let response = run(&schema(validator), "{ secretData }", None).await;

        assert_eq!(response.data.into_json().unwrap(), json!({ "secretData": null }));
        assert_eq!(response.errors.len(), 1);
        let error = &response.errors[0];
        assert_eq!(error.locations, vec![Pos { line: 3, column: 3 }]);
        assert_eq!(error.path, vec![PathSegment::Field("secretData".into())]);
        assert_eq!(
            error.message,
            "Exception while fetching data (/secretData): not authorized"
        );
    }

    #[tokio::test]
    async fn test_allowed_and_memoized_per_request() {
        let validator = Arc::new(FakeValidator::default());
        let response = run(
            &schema(validator.clone()),
            "{ a: secretData b: secretData c: secretData }",
            Some("admin"),
        )
        .await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "a": "s3cr3t", "b": "s3cr3t", "c": "s3cr3t" })
        );
        assert_eq!(validator.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_role_denies_without_validator() {
        let validator = Arc::new(FakeValidator::default());
        let response = run(&schema(validator.clone()), "{ blank }", Some("admin")).await;

        assert_eq!(response.errors.len(), 1);
        assert_eq!(validator.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_request_context_denies() {
        let validator = Arc::new(FakeValidator::default());
        let response = schema(validator.clone())
            .execute(Request::new("{ secretData publicData }"))
            .await;

        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "secretData": null, "publicData": "hello" })
        );
        assert_eq!(response.errors.len(), 1);
        assert_eq!(validator.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_validator_denies_only_guarded_field() {
        let response = run(
            &schema(Arc::new(ExplodingValidator)),
            "{ secretData publicData }",
            Some("admin"),
        )
        .await;

        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "secretData": null, "publicData": "hello" })
        );
        assert_eq!(response.errors.len(), 1);
        assert_eq!(
            response.errors[0].path,
            vec![PathSegment::Field("secretData".into())]
        );
    }

    #[test]
    fn test_undirected_field_keeps_original() {
        let registered = resolver_fn(public);
        let schema = SchemaBuilder::from_sdl(SDL)
            .unwrap()
            .field_resolver("Query", "publicData", registered.clone())
            .directive(
                SECURED_DIRECTIVE,
                Arc::new(SecuredDirectiveWiring::new(Arc::new(
                    FakeValidator::default(),
                ))),
            )
            .build()
            .unwrap();

        let installed = schema.resolver("Query", "publicData").unwrap();
        assert!(Arc::ptr_eq(installed, &registered));
    }

    #[test]
    fn test_directed_field_is_wrapped() {
        let registered = resolver_fn(secret);
        let schema = SchemaBuilder::from_sdl(SDL)
            .unwrap()
            .field_resolver("Query", "secretData", registered.clone())
            .directive(
                SECURED_DIRECTIVE,
                Arc::new(SecuredDirectiveWiring::new(Arc::new(
                    FakeValidator::default(),
                ))),
            )
            .build()
            .unwrap();

        let installed = schema.resolver("Query", "secretData").unwrap();
        assert!(!Arc::ptr_eq(installed, &registered));
    }

    #[test]
    fn test_non_string_role_rejected_at_build() {
        let result = SchemaBuilder::from_sdl("type Query { a: String @secured(requires: 1) }")
            .unwrap()
            .directive(
                SECURED_DIRECTIVE,
                Arc::new(SecuredDirectiveWiring::new(Arc::new(
                    FakeValidator::default(),
                ))),
            )
            .build();
        assert!(matches!(result, Err(GuardError::Schema(_))));
    }
}
