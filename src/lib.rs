//! GraphGuard - directive-based field authorization for GraphQL
//!
//! Fields annotated with `@secured(requires: "ROLE")` only resolve when the
//! request's bearer token grants that role. Decisions are memoized per
//! request, and resolver timings are logged by the execution tracer.

pub mod authz;
pub mod context;
pub mod demo;
pub mod errors;
pub mod resolver;
pub mod schema;
pub mod settings;
pub mod tracer;
pub mod web;
