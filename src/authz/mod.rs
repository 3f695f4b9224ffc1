//! Field-level authorization: the `@secured` directive, token checks and the
//! per-request decision cache.

pub mod cache;
pub mod errors;
pub mod signer;
pub mod validator;
pub mod wiring;

pub use cache::{DecisionCache, DecisionKey};
pub use errors::{AccessDeniedError, UNAUTHORIZED_ACCESS, UNAUTHORIZED_ACCESS_MESSAGE_KEY};
pub use signer::TokenSigner;
pub use validator::{Claims, JwtScopeValidator, TokenValidator, Verification, SCOPES_CLAIM};
pub use wiring::{GuardedResolver, SecuredDirectiveWiring, REQUIRES_ATTR, SECURED_DIRECTIVE};
