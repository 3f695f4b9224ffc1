use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GuardError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(graphguard::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(graphguard::config))]
    Config(#[from] config::ConfigError),

    #[error("Invalid listen address: {0}")]
    #[diagnostic(
        code(graphguard::addr),
        help("Check server.host and server.port")
    )]
    Addr(#[from] std::net::AddrParseError),

    #[error("SDL parse error: {0}")]
    #[diagnostic(
        code(graphguard::sdl),
        help("The schema must be a valid GraphQL SDL document")
    )]
    Sdl(#[from] async_graphql_parser::Error),

    #[error("Schema error: {0}")]
    #[diagnostic(code(graphguard::schema))]
    Schema(String),

    #[error("Authentication setup error: {0}")]
    #[diagnostic(
        code(graphguard::auth),
        help("Set a signing secret with auth.secret or GRAPHGUARD__AUTH__SECRET")
    )]
    Auth(String),

    #[error("JOSE error: {0}")]
    #[diagnostic(code(graphguard::jose))]
    Jose(String),
}

impl From<josekit::JoseError> for GuardError {
    fn from(value: josekit::JoseError) -> Self {
        GuardError::Jose(value.to_string())
    }
}
