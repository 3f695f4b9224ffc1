use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::GuardError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub server: Server,
    pub auth: Auth,
    pub logging: Logging,
    pub tracing: Tracing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Auth {
    /// HMAC secret used to verify bearer tokens (HS256)
    pub secret: String,
    /// Request header carrying the bearer token
    pub header: String,
    /// Reject tokens whose `exp` lies in the past
    #[serde(default = "default_validate_expiry")]
    pub validate_expiry: bool,
    /// Clock skew tolerated on `exp` and `nbf`
    pub leeway_secs: u64,
}

fn default_validate_expiry() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    /// Fallback filter when RUST_LOG is not set
    pub filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tracing {
    /// Log per-resolver and per-request execution times
    pub enabled: bool,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            secret: String::new(),
            header: "X-AUTH-TOKEN".to_string(),
            validate_expiry: true,
            leeway_secs: 30,
        }
    }
}

// The secret never reaches the logs.
impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("secret", &"<redacted>")
            .field("header", &self.header)
            .field("validate_expiry", &self.validate_expiry)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Default for Tracing {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self, GuardError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", Server::default().host)?
            .set_default("server.port", Server::default().port)?
            .set_default("auth.secret", Auth::default().secret)?
            .set_default("auth.header", Auth::default().header)?
            .set_default("auth.validate_expiry", Auth::default().validate_expiry)?
            .set_default("auth.leeway_secs", Auth::default().leeway_secs)?
            .set_default("logging.filter", Logging::default().filter)?
            .set_default("tracing.enabled", Tracing::default().enabled)?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: GRAPHGUARD__AUTH__SECRET=..., etc.
        builder =
            builder.add_source(config::Environment::with_prefix("GRAPHGUARD").separator("__"));

        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
