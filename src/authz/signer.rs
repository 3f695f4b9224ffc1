use josekit::jws::alg::hmac::HmacJwsSigner;
use josekit::jws::{JwsHeader, HS256};
use josekit::jwt::{self, JwtPayload};
use serde_json::Value;
use std::time::{Duration, SystemTime};

use crate::authz::validator::SCOPES_CLAIM;
use crate::errors::GuardError;

/// Issues HS256 tokens accepted by [`JwtScopeValidator`](super::validator::JwtScopeValidator)
/// configured with the same secret.
pub struct TokenSigner {
    signer: HmacJwsSigner,
}

impl TokenSigner {
    pub fn new(secret: &[u8]) -> Result<Self, GuardError> {
        if secret.is_empty() {
            return Err(GuardError::Auth("signing secret is empty".into()));
        }
        Ok(Self {
            signer: HS256.signer_from_bytes(secret)?,
        })
    }

    pub fn sign_payload(&self, payload: &JwtPayload) -> Result<String, GuardError> {
        let mut header = JwsHeader::new();
        header.set_token_type("JWT");
        Ok(jwt::encode_with_signer(payload, &header, &self.signer)?)
    }

    /// Signs a token granting `scopes`. Without `subject` the `sub` claim is
    /// left out; without `ttl` the token never expires.
    pub fn sign_scopes<S: AsRef<str>>(
        &self,
        subject: Option<&str>,
        scopes: &[S],
        ttl: Option<Duration>,
    ) -> Result<String, GuardError> {
        let now = SystemTime::now();
        let mut payload = JwtPayload::new();
        if let Some(subject) = subject {
            payload.set_subject(subject);
        }
        payload.set_issued_at(&now);
        if let Some(ttl) = ttl {
            payload.set_expires_at(&(now + ttl));
        }
        payload.set_claim(
            SCOPES_CLAIM,
            Some(Value::Array(
                scopes
                    .iter()
                    .map(|scope| Value::from(scope.as_ref()))
                    .collect(),
            )),
        )?;
        self.sign_payload(&payload)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}
