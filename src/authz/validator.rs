//! Bearer token verification and scope checks.

use josekit::jws::alg::hmac::HmacJwsVerifier;
use josekit::jws::HS256;
use josekit::jwt;
use serde_json::{Map, Value};
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, SystemTime};

use crate::errors::GuardError;
use crate::settings::Auth;

/// Claim listing the roles granted to the bearer.
pub const SCOPES_CLAIM: &str = "scopes";

/// Answers whether a credential grants a role.
///
/// Implementations fail closed: every problem with the inputs or the token
/// is a `false`, never an error.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, required_role: Option<&str>, credential: Option<&str>) -> bool;
}

/// Claim set of a verified token.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// String entries of the `scopes` claim; `None` unless it is an array.
    pub fn scopes(&self) -> Option<Vec<&str>> {
        match self.0.get(SCOPES_CLAIM)? {
            Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect()),
            _ => None,
        }
    }

    pub fn has_scope(&self, role: &str) -> bool {
        self.scopes()
            .is_some_and(|scopes| scopes.iter().any(|scope| *scope == role))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Valid(Claims),
    /// Reason is for diagnostics only and never reaches the client.
    Invalid(String),
}

/// HS256 verifier checking the `scopes` claim.
pub struct JwtScopeValidator {
    verifier: HmacJwsVerifier,
    validate_expiry: bool,
    leeway: Duration,
}

impl JwtScopeValidator {
    pub fn new(secret: &[u8]) -> Result<Self, GuardError> {
        if secret.is_empty() {
            return Err(GuardError::Auth("verification secret is empty".into()));
        }
        Ok(Self {
            verifier: HS256.verifier_from_bytes(secret)?,
            validate_expiry: true,
            leeway: Duration::from_secs(30),
        })
    }

    pub fn from_settings(auth: &Auth) -> Result<Self, GuardError> {
        Ok(Self::new(auth.secret.as_bytes())?
            .with_expiry_check(auth.validate_expiry)
            .with_leeway(Duration::from_secs(auth.leeway_secs)))
    }

    pub fn with_expiry_check(mut self, enabled: bool) -> Self {
        self.validate_expiry = enabled;
        self
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn verify(&self, token: &str) -> Verification {
        let payload = match jwt::decode_with_verifier(token, &self.verifier) {
            Ok((payload, _header)) => payload,
            Err(err) => return Verification::Invalid(err.to_string()),
        };

        if self.validate_expiry {
            let now = SystemTime::now();
            if let Some(expires_at) = payload.expires_at() {
                if expires_at + self.leeway < now {
                    return Verification::Invalid("token expired".into());
                }
            }
            if let Some(not_before) = payload.not_before() {
                if not_before > now + self.leeway {
                    return Verification::Invalid("token not yet valid".into());
                }
            }
        }

        Verification::Valid(Claims::new(payload.claims_set().clone()))
    }
}

impl TokenValidator for JwtScopeValidator {
    fn validate(&self, required_role: Option<&str>, credential: Option<&str>) -> bool {
        let (Some(role), Some(token)) = (required_role, credential) else {
            return false;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| self.verify(token))) {
            Ok(Verification::Valid(claims)) => {
                let granted = claims.has_scope(role);
                if !granted {
                    tracing::debug!(role, "Token does not grant required scope");
                }
                granted
            }
            Ok(Verification::Invalid(reason)) => {
                tracing::debug!(%reason, "Rejected bearer token");
                false
            }
            Err(_) => {
                tracing::warn!("Token verification panicked, denying");
                false
            }
        }
    }
}

impl std::fmt::Debug for JwtScopeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtScopeValidator")
            .field("validate_expiry", &self.validate_expiry)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}
