mod config;
mod http;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use platform_authn::{IdentityResolver, ProfileLoader};
use platform_db::{DbPool, connect};
use platform_obs::{ObsConfig, init_tracing};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "planning-api", version, about = "Workforce planning API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Load the configuration and probe the database, then exit.
    #[command(name = "check-config")]
    CheckConfig,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(ObsConfig::from_lookup(|key| std::env::var(key).ok()))?;
    let cli = Cli::parse();
    let config = Arc::new(AppConfig::from_env()?);
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, config).await,
        Command::CheckConfig => check_config(config).await,
    }
}

async fn setup_pool(config: &AppConfig) -> Result<DbPool> {
    connect(&config.database)
        .await
        .context("failed to open the database pool")
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let pool = setup_pool(&config).await?;
    if !platform_db::ping(&pool).await {
        warn!("database did not answer the startup probe; serving anyway");
    }
    let identity = Arc::new(IdentityResolver::new(&config.authn)?);
    let state = AppState {
        profiles: ProfileLoader::new(pool.clone()),
        pool,
        identity,
        config,
    };
    http::serve(cmd.into(), state).await
}

async fn check_config(config: Arc<AppConfig>) -> Result<()> {
    IdentityResolver::new(&config.authn)?;
    let pool = setup_pool(&config).await?;
    let db_ok = platform_db::ping(&pool).await;
    info!(
        db_ok,
        hs256 = config.authn.jwt_secret.is_some(),
        jwks_url = ?config.authn.jwks_url,
        environment = %config.environment,
        "configuration checked"
    );
    if !db_ok {
        anyhow::bail!("database did not answer");
    }
    Ok(())
}
