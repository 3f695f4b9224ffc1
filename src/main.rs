use clap::{Parser, Subcommand};
use graphguard::authz::{JwtScopeValidator, TokenSigner};
use graphguard::tracer::ExecutionTracer;
use graphguard::{demo, settings, web};
use miette::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "graphguard",
    version,
    about = "GraphQL server with directive-based field authorization"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the demo schema over HTTP (default)
    Serve,
    /// Print a signed token for manual testing
    MintToken {
        /// Scope to grant; repeat for several
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,
        /// `sub` claim; left out when not given
        #[arg(long)]
        subject: Option<String>,
        /// Lifetime in seconds; the token never expires when not given
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::load(&cli.config)?;

    // logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    fmt().with_env_filter(env_filter).init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!(?settings, "Loaded configuration");
            let validator = JwtScopeValidator::from_settings(&settings.auth)?;
            let tracer = settings.tracing.enabled.then(ExecutionTracer::new);
            let schema = demo::schema(Arc::new(validator), tracer)?;
            web::serve(settings, schema).await?;
        }
        Command::MintToken {
            scopes,
            subject,
            ttl_secs,
        } => {
            let signer = TokenSigner::new(settings.auth.secret.as_bytes())?;
            let token = signer.sign_scopes(
                subject.as_deref(),
                &scopes,
                ttl_secs.map(Duration::from_secs),
            )?;
            println!("{token}");
        }
    }
    Ok(())
}
