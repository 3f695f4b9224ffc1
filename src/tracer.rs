//! Execution timing: one log line per non-trivial resolver call and one per
//! request. Purely observational.

use async_graphql::dynamic::FieldFuture;
use async_graphql::extensions::{Extension, ExtensionContext, ExtensionFactory, NextExecute};
use async_graphql::Response;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Instant;

use crate::resolver::{resolver_fn, FieldResolver};

/// Registered on the schema as an extension for the request clock, and
/// applied to each non-trivial field resolver at build time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionTracer;

impl ExecutionTracer {
    pub fn new() -> Self {
        Self
    }

    /// Wraps `resolver` so each call logs its duration, tagged `sync` when
    /// the value is there on return and `async` when it settles later.
    pub fn instrument(
        &self,
        parent_type: &str,
        field_name: &str,
        resolver: FieldResolver,
    ) -> FieldResolver {
        let tag: Arc<str> = format!("{parent_type}.{field_name}").into();
        resolver_fn(move |ctx| {
            let started = Instant::now();
            match resolver(ctx) {
                FieldFuture::Value(value) => {
                    log_field(&tag, started, "sync");
                    FieldFuture::Value(value)
                }
                FieldFuture::Future(future) => {
                    let tag = tag.clone();
                    FieldFuture::Future(
                        future
                            .inspect(move |_| log_field(&tag, started, "async"))
                            .boxed(),
                    )
                }
            }
        })
    }
}

impl ExtensionFactory for ExecutionTracer {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(TracerExtension)
    }
}

struct TracerExtension;

#[async_trait::async_trait]
impl Extension for TracerExtension {
    async fn execute(
        &self,
        ctx: &ExtensionContext<'_>,
        operation_name: Option<&str>,
        next: NextExecute<'_>,
    ) -> Response {
        let started = Instant::now();
        let response = next.run(ctx, operation_name).await;
        tracing::info!(
            target: "graphguard::tracer",
            elapsed_ms = elapsed_ms(started),
            errors = response.errors.len(),
            "Total execution time"
        );
        response
    }
}

fn log_field(tag: &str, started: Instant, mode: &'static str) {
    tracing::info!(
        target: "graphguard::tracer",
        field = tag,
        elapsed_ms = elapsed_ms(started),
        mode,
        "Resolved field"
    );
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
