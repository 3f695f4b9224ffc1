use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::context::RequestContext;
use crate::errors::GuardError;
use crate::schema::Schema;
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub schema: Schema,
}

async fn security_headers(request: Request<Body>, next: Next) -> impl IntoResponse {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store"),
    );
    response
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/healthz", get(healthz))
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `schema` until the process stops.
pub async fn serve(settings: Settings, schema: Schema) -> Result<(), GuardError> {
    let addr: SocketAddr = settings.listen_addr().parse()?;
    let state = AppState {
        settings: Arc::new(settings),
        schema,
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "GraphQL endpoint listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let context = RequestContext::from_headers(&headers, &state.settings.auth.header);
    state
        .schema
        .execute(req.into_inner().data(context))
        .await
        .into()
}

async fn healthz() -> &'static str {
    "ok"
}
