use graphguard::authz::{JwtScopeValidator, TokenSigner, TokenValidator, SCOPES_CLAIM};
use josekit::jwt::JwtPayload;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

pub const SECRET: &str = "integration-test-secret-0123456789";

/// Builder for signed test tokens
pub struct TokenBuilder {
    subject: String,
    scopes: Option<Vec<String>>,
    expires_in: Option<Duration>,
    secret: String,
}

impl TokenBuilder {
    pub fn new() -> Self {
        Self {
            subject: "tester".to_string(),
            scopes: None,
            expires_in: Some(Duration::from_secs(300)),
            secret: SECRET.to_string(),
        }
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = Some(scopes.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_secret(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    pub fn without_expiry(mut self) -> Self {
        self.expires_in = None;
        self
    }

    pub fn build(self) -> String {
        let now = SystemTime::now();
        let mut payload = JwtPayload::new();
        payload.set_subject(&self.subject);
        payload.set_issued_at(&now);
        if let Some(ttl) = self.expires_in {
            payload.set_expires_at(&(now + ttl));
        }
        if let Some(scopes) = self.scopes {
            payload
                .set_claim(
                    SCOPES_CLAIM,
                    Some(Value::Array(scopes.into_iter().map(Value::from).collect())),
                )
                .expect("Failed to set scopes");
        }
        TokenSigner::new(self.secret.as_bytes())
            .expect("Failed to create signer")
            .sign_payload(&payload)
            .expect("Failed to sign token")
    }
}

/// Token granting `scopes`, signed with [`SECRET`]
pub fn token(scopes: &[&str]) -> String {
    TokenBuilder::new().with_scopes(scopes).build()
}

/// Real validator that counts how often it is consulted
pub struct CountingValidator {
    inner: JwtScopeValidator,
    calls: AtomicUsize,
}

impl CountingValidator {
    pub fn new() -> Self {
        Self {
            inner: JwtScopeValidator::new(SECRET.as_bytes()).expect("Failed to create validator"),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenValidator for CountingValidator {
    fn validate(&self, required_role: Option<&str>, credential: Option<&str>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.validate(required_role, credential)
    }
}
