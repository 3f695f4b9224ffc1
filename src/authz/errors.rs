use async_graphql::{ErrorExtensionValues, PathSegment, Pos, ServerError};
use std::fmt::Write;
use thiserror::Error;

/// Stable machine-readable code carried in `extensions.errorType`.
pub const UNAUTHORIZED_ACCESS: &str = "UNAUTHORIZED_ACCESS";
/// Translation key carried in `extensions.message`.
pub const UNAUTHORIZED_ACCESS_MESSAGE_KEY: &str = "errors.unauthorizedAccess";
/// Classification of every denial.
pub const DATA_FETCHING_EXCEPTION: &str = "DataFetchingException";

/// Raised in place of a field value when the caller may not resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AccessDeniedError {
    message: String,
    locations: Vec<Pos>,
    path: Vec<PathSegment>,
}

impl AccessDeniedError {
    pub fn new(locations: Vec<Pos>, path: Vec<PathSegment>) -> Self {
        Self {
            message: format!(
                "Exception while fetching data ({}): not authorized",
                render_path(&path)
            ),
            locations,
            path,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn locations(&self) -> &[Pos] {
        &self.locations
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn classification(&self) -> &'static str {
        DATA_FETCHING_EXCEPTION
    }

    pub fn extensions(&self) -> ErrorExtensionValues {
        let mut extensions = ErrorExtensionValues::default();
        extensions.set("errorType", UNAUTHORIZED_ACCESS);
        extensions.set("message", UNAUTHORIZED_ACCESS_MESSAGE_KEY);
        extensions
    }
}

impl From<AccessDeniedError> for ServerError {
    fn from(err: AccessDeniedError) -> Self {
        let extensions = err.extensions();
        let mut error = ServerError::new(err.message, None);
        error.locations = err.locations;
        error.path = err.path;
        error.extensions = Some(extensions);
        error
    }
}

/// Renders a result path as `/shows[0]/budget`.
pub fn render_path(path: &[PathSegment]) -> String {
    let mut rendered = String::new();
    for segment in path {
        // Writing to a String cannot fail
        let _ = match segment {
            PathSegment::Field(name) => write!(rendered, "/{name}"),
            PathSegment::Index(index) => write!(rendered, "[{index}]"),
        };
    }
    if rendered.is_empty() {
        rendered.push('/');
    }
    rendered
}
