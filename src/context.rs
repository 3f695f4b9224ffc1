use axum::http::HeaderMap;

use crate::authz::cache::DecisionCache;

/// Per-request state shared by every field resolution of one execution.
///
/// Built at request start, dropped when the response is assembled.
#[derive(Debug, Default)]
pub struct RequestContext {
    credential: Option<String>,
    decisions: DecisionCache,
}

impl RequestContext {
    pub fn new(credential: Option<String>) -> Self {
        Self {
            credential,
            decisions: DecisionCache::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// Reads the bearer token from `header_name`; a missing or blank header
    /// yields an unauthenticated context.
    pub fn from_headers(headers: &HeaderMap, header_name: &str) -> Self {
        let credential = headers
            .get(header_name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        Self::new(credential)
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn decisions(&self) -> &DecisionCache {
        &self.decisions
    }
}
