use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use readmate::api::{router, AppContext};
use readmate::llm::provider::{HttpCompletionClient, Provider};
use readmate::session::SessionStore;
use readmate::{AppConfig, RecommendationService};

#[derive(Parser, Debug)]
#[command(name = "readmate", about = "Survey-driven book recommendation service")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long, env = "READMATE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address from the configuration.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())
        .map_err(anyhow::Error::msg)
        .context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    if config.api_key.is_none() {
        warn!("no API key configured; recommendation requests will be rejected with 503");
    }

    let provider = Provider::parse(&config.provider).map_err(anyhow::Error::msg)?;
    let client = HttpCompletionClient::new(provider, config.api_key.clone().unwrap_or_default())
        .map_err(|e| anyhow::anyhow!("building completion client: {}", e))?;

    let store = SessionStore::open(&config.db_path);
    if !store.is_persistent() {
        warn!("sessions will not survive a restart");
    }

    let bind = config.bind.clone();
    let service = RecommendationService::new(config, Arc::new(client), store);
    let app = router(AppContext {
        service: Arc::new(service),
    });

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {}", bind))?;
    info!("readmate listening on {}", bind);
    axum::serve(listener, app).await.context("serving HTTP")?;
    Ok(())
}
