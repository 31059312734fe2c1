//! jwtgate REST server
//!
//! Run with: cargo run --release --bin jwtgate-server -- serve
//!
//! Endpoints:
//!   POST /authorise  - Trade organisation_uid/access_key for a token
//!   GET  /health     - Liveness
//!   GET  /me         - Authenticated principal (Bearer token)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jwtgate::server::{router, AppState};
use jwtgate::{AuthService, Config, Identity, LmdbStore, SystemClock};

#[derive(Parser)]
#[command(name = "jwtgate-server", version, about = "Organisation access-key JWT authorization server")]
struct Cli {
    /// TOML config file; JWTGATE_* variables override it
    #[arg(short, long, global = true, env = "JWTGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Override the listen address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Store an access key for an organisation in the credential database
    RegisterOrg {
        #[arg(long)]
        organisation_uid: String,
        #[arg(long, env = "JWTGATE_ACCESS_KEY", hide_env_values = true)]
        access_key: String,
        /// Token subject issued for this organisation
        #[arg(long)]
        subject: String,
        /// Role granted in issued tokens (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "jwtgate=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            let mut config = Config::load(cli.config.as_deref())?;
            if let Some(bind) = bind {
                config.bind = bind;
            }
            serve(config).await
        }
        Command::RegisterOrg { organisation_uid, access_key, subject, roles } => {
            // Only the store location is needed here; the secret may be absent.
            let config: Config = Config::figment(cli.config.as_deref()).extract()?;
            let store = LmdbStore::open(&config.db_path)
                .with_context(|| format!("opening credential store at {}", config.db_path.display()))?;
            let identity = Identity { subject, roles };
            store.register(&organisation_uid, &access_key, identity)?;
            println!("registered organisation {}", organisation_uid);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(?config, "starting jwtgate");

    let store = LmdbStore::open(&config.db_path)
        .with_context(|| format!("opening credential store at {}", config.db_path.display()))?;
    let auth = AuthService::new(&config, Arc::new(store), Arc::new(SystemClock))?;
    let app = router(AppState::new(auth));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(addr = %config.bind, "jwtgate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
